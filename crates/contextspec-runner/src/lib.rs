//! ContextSpec runner: resolves a discovered context tree into examples and
//! executes them.
//!
//! ```text
//! ContextTree → InstanceGraph → ExampleResolver → [Example] → ExecutionEngine → Notifier
//!            └→ describe → Description
//! ```
//!
//! [`Runner`] is the facade reporting tools drive.

pub mod config;
pub mod describe;
pub mod engine;
pub mod error;
pub mod instance;
pub mod notifier;
pub mod resolver;
pub mod runner;

pub use config::RunConfig;
pub use describe::describe;
pub use engine::{ExampleOutcome, ExampleState, ExecutionEngine};
pub use error::{ConfigError, InstanceError};
pub use instance::InstanceGraph;
pub use notifier::{Event, Notifier, RecordingNotifier};
pub use resolver::{resolve, Binding, Example, ExampleResolver, ResolvedBehavior};
pub use runner::{RunSummary, Runner};
