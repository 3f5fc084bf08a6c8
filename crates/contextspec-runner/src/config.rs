//! Run configuration: which examples the caller wants skipped.
//!
//! Entries are either an example identity (`Widget/foo#returns_bar`) or a
//! context path (`Widget/foo`) matching every example at or below it.

use contextspec_types::{ContextPath, ExampleId};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Examples reported as ignored without running.
    pub skip: Vec<String>,
    /// When non-empty, only matching examples run. The rest are ignored.
    pub only: Vec<String>,
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_skip(mut self, entry: impl Into<String>) -> Self {
        self.skip.push(entry.into());
        self
    }

    pub fn with_only(mut self, entry: impl Into<String>) -> Self {
        self.only.push(entry.into());
        self
    }

    /// `true` if the caller marked `id` as externally skipped.
    pub fn is_skipped(&self, id: &ExampleId) -> bool {
        if self.skip.iter().any(|entry| matches(entry, id)) {
            return true;
        }
        !self.only.is_empty() && !self.only.iter().any(|entry| matches(entry, id))
    }
}

fn matches(entry: &str, id: &ExampleId) -> bool {
    if entry.contains('#') {
        ExampleId::parse(entry).is_some_and(|wanted| &wanted == id)
    } else {
        id.context.starts_with(&ContextPath::parse(entry))
    }
}
