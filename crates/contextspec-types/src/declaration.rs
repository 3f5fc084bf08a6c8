//! The declaration model specs are written in.
//!
//! A spec is a tree of [`ContextClass`] values. Each class is backed by a
//! user struct whose fields hold role markers ([`Establish`], [`Because`],
//! [`It`], [`Cleanup`]) and ordinary state. Markers wrap closures that
//! usually capture shared state (`Rc<RefCell<_>>`) set up by the struct's
//! constructor, so behaviors declared on an outer context can be observed by
//! its inner contexts.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use contextspec_types::{ContextClass, Establish, It};
//!
//! struct Counter {
//!     count: Rc<RefCell<u32>>,
//!     arranges: Establish,
//!     is_one: It,
//! }
//!
//! impl Counter {
//!     fn new() -> Self {
//!         let count = Rc::new(RefCell::new(0));
//!         Self {
//!             arranges: Establish::new({
//!                 let count = count.clone();
//!                 move || *count.borrow_mut() += 1
//!             }),
//!             is_one: It::new({
//!                 let count = count.clone();
//!                 move || assert_eq!(*count.borrow(), 1)
//!             }),
//!             count,
//!         }
//!     }
//! }
//!
//! let spec = ContextClass::root("Counter", Counter::new)
//!     .field("count", |c: &Counter| &c.count)
//!     .field("arranges", |c: &Counter| &c.arranges)
//!     .field("is_one", |c: &Counter| &c.is_one);
//! assert_eq!(spec.members().len(), 3);
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::context::Role;
use crate::error::{BehaviorError, ConstructionError};

// ══════════════════════════════════════════════════════════════════════════════
// Behaviors
// ══════════════════════════════════════════════════════════════════════════════

pub type BehaviorResult = Result<(), BehaviorError>;

/// A zero-argument behavior bound to a role slot.
pub type Behavior = Rc<dyn Fn() -> BehaviorResult>;

/// Return values a behavior closure may produce.
pub trait IntoBehaviorResult {
    fn into_behavior_result(self) -> BehaviorResult;
}

impl IntoBehaviorResult for () {
    fn into_behavior_result(self) -> BehaviorResult {
        Ok(())
    }
}

impl<E: fmt::Display> IntoBehaviorResult for Result<(), E> {
    fn into_behavior_result(self) -> BehaviorResult {
        self.map_err(|e| BehaviorError::Raised(e.to_string()))
    }
}

/// Implemented by the four role marker types.
pub trait RoleMarker: Any + Clone {
    const ROLE: Role;

    /// The assigned behavior, or `None` for a pending slot.
    fn behavior(&self) -> Option<&Behavior>;
}

macro_rules! role_marker {
    ($(#[$doc:meta])* $name:ident => $role:expr) => {
        $(#[$doc])*
        #[derive(Clone, Default)]
        pub struct $name(Option<Behavior>);

        impl $name {
            pub fn new<F, R>(f: F) -> Self
            where
                F: Fn() -> R + 'static,
                R: IntoBehaviorResult,
            {
                let behavior: Behavior = Rc::new(move || f().into_behavior_result());
                Self(Some(behavior))
            }

            /// A declared but unassigned slot.
            pub fn pending() -> Self {
                Self(None)
            }

            pub fn is_assigned(&self) -> bool {
                self.0.is_some()
            }
        }

        impl RoleMarker for $name {
            const ROLE: Role = $role;

            fn behavior(&self) -> Option<&Behavior> {
                self.0.as_ref()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let state = if self.is_assigned() { "assigned" } else { "pending" };
                write!(f, "{}({state})", stringify!($name))
            }
        }
    };
}

role_marker!(
    /// Setup: arranges the state an example observes.
    Establish => Role::Setup
);
role_marker!(
    /// Action: the behavior under test, run after every setup.
    Because => Role::Action
);
role_marker!(
    /// Assertion: each `It` slot becomes one example.
    It => Role::Assertion
);
role_marker!(
    /// Cleanup: runs after the assertion.
    Cleanup => Role::Cleanup
);

impl Role {
    /// Classify a field's value type. Anything other than a marker type is
    /// ordinary instance state.
    pub fn of_type(id: TypeId) -> Option<Role> {
        if id == TypeId::of::<Establish>() {
            Some(Role::Setup)
        } else if id == TypeId::of::<Because>() {
            Some(Role::Action)
        } else if id == TypeId::of::<It>() {
            Some(Role::Assertion)
        } else if id == TypeId::of::<Cleanup>() {
            Some(Role::Cleanup)
        } else {
            None
        }
    }

    /// Extract the behavior from a value read out of a slot of this role.
    ///
    /// The outer `None` means the value is not this role's marker type.
    pub fn behavior_of(self, value: &dyn Any) -> Option<Option<Behavior>> {
        fn extract<M: RoleMarker>(value: &dyn Any) -> Option<Option<Behavior>> {
            value.downcast_ref::<M>().map(|m| m.behavior().cloned())
        }
        match self {
            Role::Setup => extract::<Establish>(value),
            Role::Action => extract::<Because>(value),
            Role::Assertion => extract::<It>(value),
            Role::Cleanup => extract::<Cleanup>(value),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Type identity
// ══════════════════════════════════════════════════════════════════════════════

/// A `TypeId` paired with its readable name.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeInfo {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Context classes
// ══════════════════════════════════════════════════════════════════════════════

/// The runtime object backing one context.
pub type Instance = Rc<dyn Any>;

/// Builds a context's instance, given its enclosing instance when nested.
pub type Constructor = Rc<dyn Fn(Option<&Instance>) -> Result<Instance, ConstructionError>>;

/// Reads a member's value out of an instance. `None` if the instance is not
/// of the type the member was declared on.
pub type MemberReader = Rc<dyn Fn(&dyn Any) -> Option<Box<dyn Any>>>;

/// How a context's instance relates to its enclosing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    /// A top-level context.
    Root,
    /// An inner context constructed from its enclosing context's instance.
    Nested { enclosing: TypeInfo },
    /// A grouping nested for reporting only; its instance is built alone.
    Standalone,
}

/// A named field on a context class.
#[derive(Clone)]
pub struct FieldDecl {
    pub name: String,
    /// Instance type the accessor was written against.
    pub owner: TypeInfo,
    pub value_type: TypeInfo,
    pub reader: MemberReader,
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecl")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

/// A member of a context class, in declaration order.
#[derive(Debug, Clone)]
pub enum Member {
    Field(FieldDecl),
    Context(ContextClass),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Field(field) => &field.name,
            Member::Context(class) => class.name(),
        }
    }
}

/// Declaration of one context: a name, a constructor for its backing
/// instance, and its members.
#[derive(Clone)]
pub struct ContextClass {
    name: String,
    nesting: Nesting,
    instance_type: TypeInfo,
    constructor: Constructor,
    members: Vec<Member>,
}

impl ContextClass {
    /// A top-level context with an infallible constructor.
    pub fn root<T, F>(name: impl Into<String>, ctor: F) -> Self
    where
        T: Any,
        F: Fn() -> T + 'static,
    {
        Self::try_root(name, move || Ok::<T, std::convert::Infallible>(ctor()))
    }

    /// A top-level context whose constructor may fail.
    pub fn try_root<T, E, F>(name: impl Into<String>, ctor: F) -> Self
    where
        T: Any,
        E: fmt::Display,
        F: Fn() -> Result<T, E> + 'static,
    {
        Self::independent(name, Nesting::Root, ctor)
    }

    /// A grouping nested for reporting purposes whose instance is built
    /// without an enclosing instance.
    pub fn standalone<T, F>(name: impl Into<String>, ctor: F) -> Self
    where
        T: Any,
        F: Fn() -> T + 'static,
    {
        Self::try_standalone(name, move || Ok::<T, std::convert::Infallible>(ctor()))
    }

    pub fn try_standalone<T, E, F>(name: impl Into<String>, ctor: F) -> Self
    where
        T: Any,
        E: fmt::Display,
        F: Fn() -> Result<T, E> + 'static,
    {
        Self::independent(name, Nesting::Standalone, ctor)
    }

    /// An inner context built from the instance of its enclosing context.
    pub fn nested<P, T, F>(name: impl Into<String>, ctor: F) -> Self
    where
        P: Any,
        T: Any,
        F: Fn(&P) -> T + 'static,
    {
        Self::try_nested(name, move |p: &P| Ok::<T, std::convert::Infallible>(ctor(p)))
    }

    pub fn try_nested<P, T, E, F>(name: impl Into<String>, ctor: F) -> Self
    where
        P: Any,
        T: Any,
        E: fmt::Display,
        F: Fn(&P) -> Result<T, E> + 'static,
    {
        let constructor: Constructor = Rc::new(move |enclosing: Option<&Instance>| {
            let parent = enclosing
                .and_then(|p| p.downcast_ref::<P>())
                .ok_or(ConstructionError::MissingEnclosing {
                    expected: type_name::<P>(),
                })?;
            match ctor(parent) {
                Ok(instance) => Ok(Rc::new(instance) as Instance),
                Err(e) => Err(BehaviorError::Raised(e.to_string()).into()),
            }
        });
        Self {
            name: name.into(),
            nesting: Nesting::Nested {
                enclosing: TypeInfo::of::<P>(),
            },
            instance_type: TypeInfo::of::<T>(),
            constructor,
            members: Vec::new(),
        }
    }

    fn independent<T, E, F>(name: impl Into<String>, nesting: Nesting, ctor: F) -> Self
    where
        T: Any,
        E: fmt::Display,
        F: Fn() -> Result<T, E> + 'static,
    {
        let constructor: Constructor = Rc::new(move |_: Option<&Instance>| match ctor() {
            Ok(instance) => Ok(Rc::new(instance) as Instance),
            Err(e) => Err(BehaviorError::Raised(e.to_string()).into()),
        });
        Self {
            name: name.into(),
            nesting,
            instance_type: TypeInfo::of::<T>(),
            constructor,
            members: Vec::new(),
        }
    }

    /// Declare a field. Its value type decides whether it is a role slot.
    pub fn field<T, V, F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        T: Any,
        V: Any + Clone,
        F: Fn(&T) -> &V + 'static,
    {
        let reader: MemberReader = Rc::new(move |instance: &dyn Any| {
            instance
                .downcast_ref::<T>()
                .map(|t| Box::new(accessor(t).clone()) as Box<dyn Any>)
        });
        self.members.push(Member::Field(FieldDecl {
            name: name.into(),
            owner: TypeInfo::of::<T>(),
            value_type: TypeInfo::of::<V>(),
            reader,
        }));
        self
    }

    /// Declare a nested context.
    pub fn context(mut self, child: ContextClass) -> Self {
        self.members.push(Member::Context(child));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nesting(&self) -> Nesting {
        self.nesting
    }

    pub fn instance_type(&self) -> TypeInfo {
        self.instance_type
    }

    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }
}

impl fmt::Debug for ContextClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextClass")
            .field("name", &self.name)
            .field("nesting", &self.nesting)
            .field("instance_type", &self.instance_type)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}
