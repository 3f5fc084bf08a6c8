//! Execution Engine: runs one resolved example through its phases.
//!
//! ```text
//! NotStarted ──skip/pending──▶ Skipped            (ignored)
//!     │
//!     ▼
//!  Running ──setups, actions, assertion, cleanups──▶ Passed | Failed
//!                                                   (started … finished)
//! ```
//!
//! A failing setup or action ends the example at once. Cleanups run after
//! the assertion whether or not it passed, and a failing cleanup does not
//! stop the ones after it.

use std::panic::{self, AssertUnwindSafe};

use contextspec_types::{BehaviorError, ExampleFailure, ExampleId, Phase, PhaseError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::notifier::Notifier;
use crate::resolver::{Binding, Example, ResolvedBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleState {
    NotStarted,
    Running,
    Passed,
    Failed,
    Skipped,
}

impl ExampleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }
}

/// The terminal state of one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleOutcome {
    pub id: ExampleId,
    pub state: ExampleState,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure: Option<ExampleFailure>,
}

impl ExampleOutcome {
    pub fn passed(&self) -> bool {
        self.state == ExampleState::Passed
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExecutionEngine;

impl ExecutionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run `example`, reporting to `notifier`. With `skip` set the example is
    /// reported as ignored and none of its behaviors run.
    pub fn run(
        &self,
        example: &Example,
        skip: bool,
        notifier: &mut dyn Notifier,
    ) -> ExampleOutcome {
        let id = &example.id;
        if skip || example.is_pending() {
            debug!(example = %id, skipped = skip, "example ignored");
            notifier.ignored(id);
            return ExampleOutcome {
                id: id.clone(),
                state: ExampleState::Skipped,
                failure: None,
            };
        }

        notifier.started(id);
        trace!(example = %id, from = ?ExampleState::NotStarted, to = ?ExampleState::Running);

        let failure = match &example.binding {
            Binding::SetupFailed(err) => Some(ExampleFailure::new(id.clone(), err.clone())),
            Binding::Resolved {
                setups,
                actions,
                assertion,
                cleanups,
            } => execute(id, setups, actions, assertion, cleanups),
        };

        let state = match &failure {
            Some(failure) => {
                warn!(example = %id, phase = %failure.phase(), error = %failure.primary, "example failed");
                notifier.failed(id, failure);
                ExampleState::Failed
            }
            None => ExampleState::Passed,
        };
        notifier.finished(id);
        trace!(example = %id, from = ?ExampleState::Running, to = ?state);

        ExampleOutcome {
            id: id.clone(),
            state,
            failure,
        }
    }
}

fn execute(
    id: &ExampleId,
    setups: &[ResolvedBehavior],
    actions: &[ResolvedBehavior],
    assertion: &ResolvedBehavior,
    cleanups: &[ResolvedBehavior],
) -> Option<ExampleFailure> {
    for (phase, behaviors) in [(Phase::Setup, setups), (Phase::Action, actions)] {
        for behavior in behaviors {
            if let Err(err) = invoke(behavior, phase) {
                return Some(ExampleFailure::new(id.clone(), err));
            }
        }
    }

    let mut errors = Vec::new();
    if let Err(err) = invoke(assertion, Phase::Assertion) {
        errors.push(err);
    }
    for cleanup in cleanups {
        if let Err(err) = invoke(cleanup, Phase::Cleanup) {
            errors.push(err);
        }
    }

    let mut errors = errors.into_iter();
    let primary = errors.next()?;
    Some(ExampleFailure {
        example: id.clone(),
        primary,
        suppressed: errors.collect(),
    })
}

/// Call one behavior, turning an `Err` or a panic into a [`PhaseError`].
fn invoke(resolved: &ResolvedBehavior, phase: Phase) -> Result<(), PhaseError> {
    let Some(behavior) = &resolved.behavior else {
        return Ok(());
    };
    trace!(slot = %resolved.slot, %phase, "invoking behavior");
    panic::catch_unwind(AssertUnwindSafe(|| behavior()))
        .unwrap_or_else(|payload| Err(BehaviorError::from_panic(payload)))
        .map_err(|err| PhaseError::new(phase, resolved.slot.clone(), err.to_string()))
}
