//! Ctrl-C handling.
//!
//! During the execute phase an interrupt only raises a flag; the executor
//! stops before its next delete and the partial report is still produced.
//! Anywhere else (listing, prompts) the process ends with status 130, after
//! printing whatever output a command registered with [`set_pending_output`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Exit status used when the process is ended by Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static EXECUTING: AtomicBool = AtomicBool::new(false);
static DELETES_ISSUED: AtomicBool = AtomicBool::new(false);
static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();
static PENDING_OUTPUT: Mutex<Option<String>> = Mutex::new(None);

/// Shared cancellation flag, checked before each delete.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Install the process-wide Ctrl-C handler and return the token it raises.
///
/// Safe to call more than once; later calls return a token sharing the
/// first call's flag.
pub fn install() -> CancelToken {
    let flag = FLAG.get_or_init(|| {
        let flag = Arc::new(AtomicBool::new(false));
        let raised = flag.clone();
        if let Err(err) = ctrlc::set_handler(move || on_interrupt(&raised)) {
            tracing::warn!(error = %err, "failed to install Ctrl-C handler");
        }
        flag
    });

    CancelToken { flag: flag.clone() }
}

/// Marks the execute phase for as long as the guard lives.
pub struct ExecutingGuard {
    _private: (),
}

impl ExecutingGuard {
    pub fn enter() -> Self {
        EXECUTING.store(true, Ordering::SeqCst);
        Self { _private: () }
    }
}

impl Drop for ExecutingGuard {
    fn drop(&mut self) {
        EXECUTING.store(false, Ordering::SeqCst);
    }
}

/// Record that at least one delete has been sent in this process.
pub fn note_delete_issued() {
    DELETES_ISSUED.store(true, Ordering::SeqCst);
}

pub fn deletes_issued() -> bool {
    DELETES_ISSUED.load(Ordering::SeqCst)
}

/// Output printed to stdout if Ctrl-C ends the process. `None` clears it.
pub fn set_pending_output(output: Option<String>) {
    match PENDING_OUTPUT.lock() {
        Ok(mut pending) => *pending = output,
        Err(poisoned) => *poisoned.into_inner() = output,
    }
}

fn take_pending_output() -> Option<String> {
    match PENDING_OUTPUT.lock() {
        Ok(mut pending) => pending.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

pub fn interrupted_message(deletes_issued: bool) -> &'static str {
    if deletes_issued {
        "Interrupted. Deletes already issued are not undone; see the report for what ran."
    } else {
        "Interrupted. Nothing was deleted."
    }
}

fn on_interrupt(flag: &AtomicBool) {
    if EXECUTING.load(Ordering::SeqCst) {
        flag.store(true, Ordering::SeqCst);
        tracing::warn!("interrupt received, stopping after the current delete");
        return;
    }

    if let Some(output) = take_pending_output() {
        println!("{}", output);
    }
    eprintln!("\n{}", interrupted_message(deletes_issued()));
    std::process::exit(INTERRUPTED_EXIT_CODE);
}
