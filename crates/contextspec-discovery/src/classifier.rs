//! Role classification of a single context class.

use contextspec_types::{ContextClass, FieldDecl, Member, Role};

/// The members of one context class, sorted by role.
///
/// Every list keeps declaration order, which is the ordering convention for
/// slots sharing a role.
#[derive(Debug, Default)]
pub struct Classification<'a> {
    pub setups: Vec<&'a FieldDecl>,
    pub actions: Vec<&'a FieldDecl>,
    pub assertions: Vec<&'a FieldDecl>,
    pub cleanups: Vec<&'a FieldDecl>,
    /// Fields that are not role slots.
    pub state: Vec<&'a FieldDecl>,
    pub children: Vec<&'a ContextClass>,
}

impl<'a> Classification<'a> {
    pub fn slots(&self, role: Role) -> &[&'a FieldDecl] {
        match role {
            Role::Setup => &self.setups,
            Role::Action => &self.actions,
            Role::Assertion => &self.assertions,
            Role::Cleanup => &self.cleanups,
        }
    }

    fn slots_mut(&mut self, role: Role) -> &mut Vec<&'a FieldDecl> {
        match role {
            Role::Setup => &mut self.setups,
            Role::Action => &mut self.actions,
            Role::Assertion => &mut self.assertions,
            Role::Cleanup => &mut self.cleanups,
        }
    }

    /// Number of role slots of any role.
    pub fn slot_count(&self) -> usize {
        Role::ALL.iter().map(|r| self.slots(*r).len()).sum()
    }

    /// `true` if the class declares no role slots and no nested contexts.
    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0 && self.children.is_empty()
    }
}

/// Classify the members declared directly on `class`. Nested classes are
/// listed but not classified.
pub fn classify(class: &ContextClass) -> Classification<'_> {
    let mut classification = Classification::default();
    for member in class.members() {
        match member {
            Member::Field(field) => match Role::of_type(field.value_type.id) {
                Some(role) => classification.slots_mut(role).push(field),
                None => classification.state.push(field),
            },
            Member::Context(child) => classification.children.push(child),
        }
    }
    classification
}
