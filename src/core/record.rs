//! Resource records parsed from listing responses.

use serde::Serialize;

/// One named attribute of a listed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A deletable external resource: an index, an image digest or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: String,
    /// Listing order is preserved.
    pub attributes: Vec<Attribute>,
}

impl ResourceRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Id followed by every attribute value, no separators.
    pub fn concatenated(&self) -> String {
        let mut joined = self.id.clone();
        for attr in &self.attributes {
            joined.push_str(&attr.value);
        }
        joined
    }
}

/// Parse a whitespace-columned listing.
///
/// The first field of each line is the id; the remaining fields are named
/// from `columns`, with unnamed extras called `field_<n>`. Blank lines are
/// skipped.
pub fn parse_columns(raw: &str, columns: &[String]) -> Vec<ResourceRecord> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?;
            let record = fields.enumerate().fold(ResourceRecord::new(id), |record, (i, value)| {
                let name = columns
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("field_{}", i + 1));
                record.with_attribute(name, value)
            });
            Some(record)
        })
        .collect()
}
