//! Notification sink for example progress.

use contextspec_types::{ExampleFailure, ExampleId};
use serde::{Deserialize, Serialize};

/// Receives per-example lifecycle notifications in execution order.
///
/// A run example produces `started`, an optional `failed`, then `finished`.
/// A skipped or pending example produces `ignored` alone.
pub trait Notifier {
    fn started(&mut self, id: &ExampleId);
    fn ignored(&mut self, id: &ExampleId);
    fn failed(&mut self, id: &ExampleId, cause: &ExampleFailure);
    fn finished(&mut self, id: &ExampleId);
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    Started { id: ExampleId },
    Ignored { id: ExampleId },
    Failed { id: ExampleId, cause: ExampleFailure },
    Finished { id: ExampleId },
}

impl Event {
    pub fn id(&self) -> &ExampleId {
        match self {
            Self::Started { id }
            | Self::Ignored { id }
            | Self::Failed { id, .. }
            | Self::Finished { id } => id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Ignored { .. } => "ignored",
            Self::Failed { .. } => "failed",
            Self::Finished { .. } => "finished",
        }
    }
}

/// In-memory sink keeping every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub events: Vec<Event>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event names for one example, e.g. `["started", "failed", "finished"]`.
    pub fn sequence_for(&self, id: &ExampleId) -> Vec<&'static str> {
        self.events
            .iter()
            .filter(|e| e.id() == id)
            .map(Event::name)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExampleFailure> {
        self.events.iter().filter_map(|e| match e {
            Event::Failed { cause, .. } => Some(cause),
            _ => None,
        })
    }
}

impl Notifier for RecordingNotifier {
    fn started(&mut self, id: &ExampleId) {
        self.events.push(Event::Started { id: id.clone() });
    }

    fn ignored(&mut self, id: &ExampleId) {
        self.events.push(Event::Ignored { id: id.clone() });
    }

    fn failed(&mut self, id: &ExampleId, cause: &ExampleFailure) {
        self.events.push(Event::Failed {
            id: id.clone(),
            cause: cause.clone(),
        });
    }

    fn finished(&mut self, id: &ExampleId) {
        self.events.push(Event::Finished { id: id.clone() });
    }
}
