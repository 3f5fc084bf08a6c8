//! Example Resolver: one [`Example`] per assertion slot, bound to the
//! setup, action and cleanup slots on the path from the root.
//!
//! Slot lists are concatenated outer-to-inner, then in declaration order
//! within each context. Slot values are read from instances supplied by a
//! single [`InstanceGraph`], so the whole resolution shares one set of
//! instances.

use std::fmt;

use contextspec_types::{
    Behavior, Context, ContextId, ContextTree, ExampleId, Phase, PhaseError, Role, RoleSlot,
};
use tracing::debug;

use crate::instance::InstanceGraph;

/// A slot value read out of its instance.
#[derive(Clone)]
pub struct ResolvedBehavior {
    /// `context/path.slot`.
    pub slot: String,
    pub role: Role,
    /// `None` when the slot was declared but left unassigned.
    pub behavior: Option<Behavior>,
}

impl ResolvedBehavior {
    pub fn is_assigned(&self) -> bool {
        self.behavior.is_some()
    }
}

impl fmt::Debug for ResolvedBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBehavior")
            .field("slot", &self.slot)
            .field("role", &self.role)
            .field("assigned", &self.is_assigned())
            .finish()
    }
}

/// What an example runs.
#[derive(Debug, Clone)]
pub enum Binding {
    Resolved {
        setups: Vec<ResolvedBehavior>,
        actions: Vec<ResolvedBehavior>,
        assertion: ResolvedBehavior,
        cleanups: Vec<ResolvedBehavior>,
    },
    /// An instance or slot the example depends on could not be read. The
    /// example reports this failure when run.
    SetupFailed(PhaseError),
}

/// One resolved, runnable example.
#[derive(Debug, Clone)]
pub struct Example {
    pub id: ExampleId,
    /// The context declaring the assertion.
    pub context: ContextId,
    pub binding: Binding,
}

impl Example {
    /// The assertion slot name.
    pub fn display_name(&self) -> &str {
        &self.id.name
    }

    /// `true` if any bound slot is unassigned. Pending examples are reported
    /// as ignored and never run.
    pub fn is_pending(&self) -> bool {
        match &self.binding {
            Binding::Resolved {
                setups,
                actions,
                assertion,
                cleanups,
            } => {
                !assertion.is_assigned()
                    || setups
                        .iter()
                        .chain(actions)
                        .chain(cleanups)
                        .any(|b| !b.is_assigned())
            }
            Binding::SetupFailed(_) => false,
        }
    }

    pub fn setup_failure(&self) -> Option<&PhaseError> {
        match &self.binding {
            Binding::SetupFailed(err) => Some(err),
            Binding::Resolved { .. } => None,
        }
    }
}

/// Resolve every example in `tree` with a fresh instance graph.
pub fn resolve(tree: &ContextTree) -> Vec<Example> {
    ExampleResolver::new(tree).resolve()
}

pub struct ExampleResolver<'t> {
    tree: &'t ContextTree,
    graph: InstanceGraph<'t>,
}

impl<'t> ExampleResolver<'t> {
    pub fn new(tree: &'t ContextTree) -> Self {
        Self {
            tree,
            graph: InstanceGraph::new(tree),
        }
    }

    /// Examples in description order: a context's nested contexts first,
    /// depth-first, then its own assertions in declaration order.
    pub fn resolve(mut self) -> Vec<Example> {
        let tree = self.tree;
        let mut examples = Vec::new();
        self.collect(tree.root(), &mut examples);
        examples
    }

    fn collect(&mut self, context: &'t Context, examples: &mut Vec<Example>) {
        let tree = self.tree;
        for child in tree.children(context) {
            self.collect(child, examples);
        }
        for assertion in &context.assertions {
            let example = self.resolve_one(context, assertion);
            debug!(
                example = %example.id,
                pending = example.is_pending(),
                setup_failed = example.setup_failure().is_some(),
                "resolved example"
            );
            examples.push(example);
        }
    }

    /// Instances constructed so far by this resolver's graph.
    pub fn constructed_count(&self) -> usize {
        self.graph.constructed_count()
    }

    fn resolve_one(&mut self, context: &Context, assertion: &RoleSlot) -> Example {
        let id = ExampleId::new(context.path.clone(), assertion.name.clone());
        let binding = match self.bind(context, assertion) {
            Ok(binding) => binding,
            Err(err) => Binding::SetupFailed(err),
        };
        Example {
            id,
            context: context.id,
            binding,
        }
    }

    fn bind(&mut self, context: &Context, assertion: &RoleSlot) -> Result<Binding, PhaseError> {
        let tree = self.tree;
        let ancestry = tree.ancestry(context);

        let mut setups = Vec::new();
        let mut actions = Vec::new();
        let mut cleanups = Vec::new();
        for level in &ancestry {
            for slot in &level.setups {
                setups.push(self.read(level, slot)?);
            }
            for slot in &level.actions {
                actions.push(self.read(level, slot)?);
            }
            for slot in &level.cleanups {
                cleanups.push(self.read(level, slot)?);
            }
        }
        let assertion = self.read(context, assertion)?;

        Ok(Binding::Resolved {
            setups,
            actions,
            assertion,
            cleanups,
        })
    }

    fn read(&mut self, owner: &Context, slot: &RoleSlot) -> Result<ResolvedBehavior, PhaseError> {
        let instance = self.graph.instance_for(owner).map_err(|err| {
            PhaseError::new(Phase::Construction, err.context.to_string(), err.source.to_string())
        })?;

        let unreadable = |detail: String| {
            PhaseError::new(Phase::SlotAccess, slot.qualified_name(), detail)
        };
        let value = (slot.reader)(&*instance).ok_or_else(|| {
            unreadable(format!(
                "instance is not a {}",
                owner.instance_type.name
            ))
        })?;
        let behavior = slot.role.behavior_of(&*value).ok_or_else(|| {
            unreadable(format!("value is not a {}", slot.role.marker_name()))
        })?;

        Ok(ResolvedBehavior {
            slot: slot.qualified_name(),
            role: slot.role,
            behavior,
        })
    }
}
