//! ContextSpec discovery: turns a root [`ContextClass`] into a [`ContextTree`].
//!
//! ```text
//! ContextClass → Role Classifier → Tree Builder → ContextTree + InitializationErrors
//! ```
//!
//! [`ContextClass`]: contextspec_types::ContextClass
//! [`ContextTree`]: contextspec_types::ContextTree

mod builder;
mod classifier;

pub use builder::{build, BuildResult, TreeBuilder};
pub use classifier::{classify, Classification};
