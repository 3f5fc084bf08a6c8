//! Shared types for ContextSpec.
//!
//! This crate defines the declaration model users write specs with (role
//! marker types and [`ContextClass`]), the immutable context tree produced by
//! discovery, the error taxonomy, and the description tree handed to
//! reporting tools.

mod context;
mod declaration;
mod description;
mod error;

pub use context::{Context, ContextId, ContextPath, ContextTree, ExampleId, Role, RoleSlot};
pub use declaration::{
    Because, Behavior, BehaviorResult, Cleanup, Constructor, ContextClass, Establish, FieldDecl,
    Instance, IntoBehaviorResult, It, Member, MemberReader, Nesting, RoleMarker, TypeInfo,
};
pub use description::Description;
pub use error::{
    BehaviorError, ConstructionError, ExampleFailure, InitializationError, InitializationErrors,
    Phase, PhaseError,
};
