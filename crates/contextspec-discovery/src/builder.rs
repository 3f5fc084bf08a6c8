//! Context Tree Builder: recursively classifies a root class and its nested
//! classes into an immutable [`ContextTree`].
//!
//! Structural problems never stop the walk. Each one is recorded and the
//! offending member is skipped, so a single pass reports every problem.

use std::collections::HashSet;

use contextspec_types::{
    Context, ContextClass, ContextId, ContextPath, ContextTree, FieldDecl, InitializationError,
    InitializationErrors, Nesting, Role, RoleSlot,
};
use tracing::{debug, warn};

use crate::classifier::classify;

/// Result of discovery: the tree plus every structural error found.
#[derive(Debug)]
pub struct BuildResult {
    pub tree: ContextTree,
    pub errors: InitializationErrors,
}

impl BuildResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Discover the context tree rooted at `root`.
pub fn build(root: &ContextClass) -> BuildResult {
    TreeBuilder::new().build(root)
}

/// Walks context classes depth-first, collecting errors as it goes.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    errors: InitializationErrors,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self, root: &ContextClass) -> BuildResult {
        if root.name().is_empty() {
            self.error(InitializationError::EmptyRootName);
        }
        if matches!(root.nesting(), Nesting::Nested { .. }) {
            self.error(InitializationError::RootRequiresEnclosing {
                context: root.name().to_string(),
            });
        }

        let path = ContextPath::root(root.name());
        let (node, children) = self.node(root, path);
        let mut tree = ContextTree::new(node);
        let root_id = tree.root().id;
        let root_path = tree.root().path.clone();
        for child in children {
            self.attach(&mut tree, root_id, &root_path, root, child);
        }

        debug!(
            root = root.name(),
            contexts = tree.len(),
            errors = self.errors.len(),
            "context tree built"
        );
        BuildResult {
            tree,
            errors: self.errors,
        }
    }

    fn attach(
        &mut self,
        tree: &mut ContextTree,
        parent_id: ContextId,
        parent_path: &ContextPath,
        parent: &ContextClass,
        class: &ContextClass,
    ) {
        if class.name().is_empty() {
            self.error(InitializationError::EmptyName {
                parent: parent_path.clone(),
            });
        }
        let path = parent_path.child(class.name());

        if let Nesting::Nested { enclosing } = class.nesting() {
            if enclosing != parent.instance_type() {
                self.error(InitializationError::MismatchedEnclosing {
                    context: path.clone(),
                    expected: parent.instance_type().name,
                    found: enclosing.name,
                });
            }
        }

        let (node, children) = self.node(class, path.clone());
        let id = tree.add_child(parent_id, node);
        for child in children {
            self.attach(tree, id, &path, class, child);
        }
    }

    /// Classify one class into a detached node. Returns the node and the
    /// nested classes still to attach under it.
    fn node<'a>(
        &mut self,
        class: &'a ContextClass,
        path: ContextPath,
    ) -> (Context, Vec<&'a ContextClass>) {
        let classification = classify(class);
        let mut seen = HashSet::new();
        for member in class.members() {
            if !seen.insert(member.name()) {
                self.error(InitializationError::DuplicateMember {
                    context: path.clone(),
                    member: member.name().to_string(),
                });
            }
        }

        let mut accepted = HashSet::new();
        let mut slots = |role: Role, this: &mut Self| -> Vec<RoleSlot> {
            classification
                .slots(role)
                .iter()
                .filter(|field| this.accept_field(class, &path, **field, &mut accepted))
                .map(|field| RoleSlot {
                    context: path.clone(),
                    name: field.name.clone(),
                    role,
                    reader: field.reader.clone(),
                })
                .collect()
        };
        let setups = slots(Role::Setup, self);
        let actions = slots(Role::Action, self);
        let assertions = slots(Role::Assertion, self);
        let cleanups = slots(Role::Cleanup, self);
        for field in &classification.state {
            self.accept_field(class, &path, *field, &mut accepted);
        }

        debug!(
            context = %path,
            setups = setups.len(),
            actions = actions.len(),
            assertions = assertions.len(),
            cleanups = cleanups.len(),
            children = classification.children.len(),
            "classified context"
        );

        let node = Context {
            id: ContextId(0),
            path,
            parent: None,
            children: Vec::new(),
            nesting: class.nesting(),
            instance_type: class.instance_type(),
            constructor: class.constructor().clone(),
            setups,
            actions,
            assertions,
            cleanups,
        };
        let mut child_names = HashSet::new();
        let children = classification
            .children
            .into_iter()
            .filter(|child| child_names.insert(child.name()))
            .collect();
        (node, children)
    }

    /// A field is kept unless it reads from a different instance type or
    /// repeats a name already taken by an earlier field.
    fn accept_field<'a>(
        &mut self,
        class: &ContextClass,
        path: &ContextPath,
        field: &'a FieldDecl,
        accepted: &mut HashSet<&'a str>,
    ) -> bool {
        if field.owner != class.instance_type() {
            self.error(InitializationError::ForeignMember {
                context: path.clone(),
                member: field.name.clone(),
                expected: class.instance_type().name,
                found: field.owner.name,
            });
            return false;
        }
        accepted.insert(field.name.as_str())
    }

    fn error(&mut self, error: InitializationError) {
        warn!(%error, "initialization error");
        self.errors.push(error);
    }
}
