use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ContextPath, ExampleId};

// ══════════════════════════════════════════════════════════════════════════════
// Initialization errors
// ══════════════════════════════════════════════════════════════════════════════

/// A structural problem found while discovering a context tree.
///
/// These never abort discovery. They are collected into
/// [`InitializationErrors`] and reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitializationError {
    #[error("Test context '{context}' must contain at least 1 example in an It field")]
    NoExamples { context: String },

    #[error("context {context} declares member '{member}' more than once")]
    DuplicateMember { context: ContextPath, member: String },

    #[error("member {context}.{member} reads from {found}, but the context is backed by {expected}")]
    ForeignMember {
        context: ContextPath,
        member: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("context {context} must be constructed from {found}, but is declared inside {expected}")]
    MismatchedEnclosing {
        context: ContextPath,
        expected: &'static str,
        found: &'static str,
    },

    #[error("root context '{context}' is declared as nested and has no enclosing context")]
    RootRequiresEnclosing { context: String },

    #[error("context declared under {parent} has an empty name")]
    EmptyName { parent: ContextPath },

    #[error("root context has an empty name")]
    EmptyRootName,
}

/// Every initialization error found for one run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializationErrors {
    errors: Vec<InitializationError>,
}

impl InitializationErrors {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: InitializationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: InitializationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InitializationError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<InitializationError> {
        self.errors
    }
}

impl fmt::Display for InitializationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} initialization error(s):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "- {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InitializationErrors {}

impl FromIterator<InitializationError> for InitializationErrors {
    fn from_iter<I: IntoIterator<Item = InitializationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Behavior and construction errors
// ══════════════════════════════════════════════════════════════════════════════

/// A failure raised by user code: a behavior or a context constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum BehaviorError {
    /// The behavior returned an `Err`.
    #[error("{0}")]
    Raised(String),
    /// The behavior panicked, e.g. a failed `assert_eq!`.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl BehaviorError {
    /// Convert a payload caught by `catch_unwind` into an error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Raised(msg) | Self::Panicked(msg) => msg,
        }
    }
}

/// Why the instance backing a context could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("expected an enclosing instance of {expected}")]
    MissingEnclosing { expected: &'static str },

    #[error("constructor failed: {0}")]
    Failed(#[from] BehaviorError),
}

// ══════════════════════════════════════════════════════════════════════════════
// Example failures
// ══════════════════════════════════════════════════════════════════════════════

/// The step of an example in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Building the instance of a context the example depends on.
    Construction,
    /// Reading a role slot's value from its instance.
    SlotAccess,
    Setup,
    Action,
    Assertion,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction => write!(f, "construction"),
            Self::SlotAccess => write!(f, "slot access"),
            Self::Setup => write!(f, "setup"),
            Self::Action => write!(f, "action"),
            Self::Assertion => write!(f, "assertion"),
            Self::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// A failure attributed to one phase of one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseError {
    pub phase: Phase,
    /// The context or slot that failed, e.g. `Widget/foo.that`.
    pub source: String,
    pub message: String,
}

impl PhaseError {
    pub fn new(phase: Phase, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phase,
            source: source.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed in {}: {}", self.phase, self.source, self.message)
    }
}

/// The cause reported with a failed example.
///
/// The first failure is primary. Cleanup failures that happen after it are
/// kept as suppressed causes so a single notification carries all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleFailure {
    pub example: ExampleId,
    pub primary: PhaseError,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub suppressed: Vec<PhaseError>,
}

impl ExampleFailure {
    pub fn new(example: ExampleId, primary: PhaseError) -> Self {
        Self {
            example,
            primary,
            suppressed: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.primary.phase
    }

    /// All causes, primary first.
    pub fn causes(&self) -> impl Iterator<Item = &PhaseError> {
        std::iter::once(&self.primary).chain(self.suppressed.iter())
    }
}

impl fmt::Display for ExampleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.example, self.primary)?;
        for suppressed in &self.suppressed {
            write!(f, "\n  also: {suppressed}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExampleFailure {}
