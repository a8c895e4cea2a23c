//! The confirmation gate in front of every destructive run.

use crate::error::Result;
use crate::record::ResourceRecord;

/// What the operator is asked to approve.
#[derive(Debug, Clone, Copy)]
pub enum ConfirmationRequest<'a> {
    /// Every candidate, with full attribute detail.
    Candidates {
        target_kind: &'a str,
        group: Option<&'a str>,
        candidates: &'a [ResourceRecord],
    },
    /// A whole multi-group operation whose candidates are not known yet.
    Operation { description: &'a str },
}

/// Source of operator answers. Returns the raw line the operator typed,
/// or `None` on end of input.
pub trait Confirmer {
    fn ask(&mut self, request: &ConfirmationRequest<'_>) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Abort,
}

/// Only `y` or `Y` proceeds. Line terminators are stripped, nothing else.
pub fn evaluate(answer: Option<&str>) -> Decision {
    match answer.map(|a| a.trim_end_matches(['\r', '\n'])) {
        Some("y") | Some("Y") => Decision::Proceed,
        _ => Decision::Abort,
    }
}

/// Ask once and decide.
pub fn gate(confirmer: &mut dyn Confirmer, request: &ConfirmationRequest<'_>) -> Result<Decision> {
    let answer = confirmer.ask(request)?;
    let decision = evaluate(answer.as_deref());
    tracing::info!(?decision, "confirmation answered");
    Ok(decision)
}

/// Confirmer replaying a fixed answer. Used for non-interactive replays and tests.
#[derive(Debug, Clone)]
pub struct FixedAnswer {
    answer: Option<String>,
    pub asked: usize,
}

impl FixedAnswer {
    pub fn new(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_string),
            asked: 0,
        }
    }
}

impl Confirmer for FixedAnswer {
    fn ask(&mut self, _request: &ConfirmationRequest<'_>) -> Result<Option<String>> {
        self.asked += 1;
        Ok(self.answer.clone())
    }
}
