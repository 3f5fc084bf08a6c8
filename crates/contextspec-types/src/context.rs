//! The immutable context tree produced by discovery.
//!
//! Nodes live in an arena owned by [`ContextTree`] and refer to each other by
//! [`ContextId`]. The root is always the first node, and nodes are stored in
//! depth-first declaration order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::declaration::{Constructor, MemberReader, Nesting, TypeInfo};

// ══════════════════════════════════════════════════════════════════════════════
// Identity
// ══════════════════════════════════════════════════════════════════════════════

/// Index of a context inside its [`ContextTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub usize);

/// Fully qualified path of a context from the root, e.g. `Widget/foo/bar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextPath(Vec<String>);

impl ContextPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// The path of a context declared directly inside this one.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The last segment: the context's own declared name.
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// `true` if `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &ContextPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Parse a `/`-separated path.
    pub fn parse(text: &str) -> Self {
        Self(text.split('/').map(str::to_string).collect())
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Identity of an example: its owning context plus the assertion slot name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExampleId {
    pub context: ContextPath,
    pub name: String,
}

impl ExampleId {
    pub fn new(context: ContextPath, name: impl Into<String>) -> Self {
        Self {
            context,
            name: name.into(),
        }
    }

    /// Parse the `context/path#name` form produced by `Display`.
    pub fn parse(text: &str) -> Option<Self> {
        let (context, name) = text.rsplit_once('#')?;
        Some(Self::new(ContextPath::parse(context), name))
    }
}

impl fmt::Display for ExampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.context, self.name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Role slots
// ══════════════════════════════════════════════════════════════════════════════

/// The role a slot plays in an example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// `Establish`: arranges state before the action.
    Setup,
    /// `Because`: the behavior under test.
    Action,
    /// `It`: one assertion, and therefore one example.
    Assertion,
    /// `Cleanup`: releases whatever setup acquired.
    Cleanup,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Setup, Role::Action, Role::Assertion, Role::Cleanup];

    /// Name of the marker type declaring this role.
    pub fn marker_name(self) -> &'static str {
        match self {
            Self::Setup => "Establish",
            Self::Action => "Because",
            Self::Assertion => "It",
            Self::Cleanup => "Cleanup",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Action => write!(f, "action"),
            Self::Assertion => write!(f, "assertion"),
            Self::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// A named behavior declared on a context.
#[derive(Clone)]
pub struct RoleSlot {
    pub context: ContextPath,
    pub name: String,
    pub role: Role,
    /// Reads the slot's marker value out of the owning context's instance.
    pub reader: MemberReader,
}

impl RoleSlot {
    /// `context/path.slot`, used in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.context, self.name)
    }
}

impl fmt::Debug for RoleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleSlot")
            .field("context", &self.context)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Context
// ══════════════════════════════════════════════════════════════════════════════

/// One declaration level of a spec: a root or a nested grouping.
#[derive(Clone)]
pub struct Context {
    pub id: ContextId,
    pub path: ContextPath,
    pub parent: Option<ContextId>,
    pub children: Vec<ContextId>,
    pub nesting: Nesting,
    /// Type of the user struct backing this context.
    pub instance_type: TypeInfo,
    pub constructor: Constructor,
    pub setups: Vec<RoleSlot>,
    pub actions: Vec<RoleSlot>,
    pub assertions: Vec<RoleSlot>,
    pub cleanups: Vec<RoleSlot>,
}

impl Context {
    /// The context's own declared name.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Slots of one role, in declaration order.
    pub fn slots(&self, role: Role) -> &[RoleSlot] {
        match role {
            Role::Setup => &self.setups,
            Role::Action => &self.actions,
            Role::Assertion => &self.assertions,
            Role::Cleanup => &self.cleanups,
        }
    }

    /// `true` if this context's instance is built without an enclosing one.
    pub fn stands_alone(&self) -> bool {
        !matches!(self.nesting, Nesting::Nested { .. })
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("nesting", &self.nesting)
            .field("instance_type", &self.instance_type)
            .field("setups", &self.setups)
            .field("actions", &self.actions)
            .field("assertions", &self.assertions)
            .field("cleanups", &self.cleanups)
            .finish_non_exhaustive()
    }
}

/// The full context hierarchy of one spec.
#[derive(Debug, Clone)]
pub struct ContextTree {
    nodes: Vec<Context>,
}

impl ContextTree {
    /// Start a tree from its root node. The root's id, parent and children
    /// are overwritten.
    pub fn new(mut root: Context) -> Self {
        root.id = ContextId(0);
        root.parent = None;
        root.children.clear();
        Self { nodes: vec![root] }
    }

    /// Attach `child` under `parent` and return its id. Children are kept in
    /// the order they are added.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn add_child(&mut self, parent: ContextId, mut child: Context) -> ContextId {
        assert!(parent.0 < self.nodes.len(), "unknown parent {parent:?}");
        let id = ContextId(self.nodes.len());
        child.id = id;
        child.parent = Some(parent);
        child.children.clear();
        self.nodes.push(child);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> &Context {
        &self.nodes[0]
    }

    pub fn get(&self, id: ContextId) -> Option<&Context> {
        self.nodes.get(id.0)
    }

    /// Look up a context by its path.
    pub fn find(&self, path: &ContextPath) -> Option<&Context> {
        self.nodes.iter().find(|c| &c.path == path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, context: &Context) -> Option<&Context> {
        context.parent.and_then(|id| self.get(id))
    }

    pub fn children<'a>(&'a self, context: &'a Context) -> impl Iterator<Item = &'a Context> + 'a {
        context.children.iter().filter_map(move |id| self.get(*id))
    }

    /// The chain from the root down to and including `context`.
    pub fn ancestry<'a>(&'a self, context: &'a Context) -> Vec<&'a Context> {
        let mut chain = vec![context];
        let mut current = context;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// All contexts, depth-first in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.collect_preorder(self.root(), &mut order);
        order.into_iter()
    }

    fn collect_preorder<'a>(&'a self, context: &'a Context, out: &mut Vec<&'a Context>) {
        out.push(context);
        for child in self.children(context) {
            self.collect_preorder(child, out);
        }
    }

    /// Total assertion slots in the subtree rooted at `context`.
    pub fn assertion_count(&self, context: &Context) -> usize {
        context.assertions.len()
            + self
                .children(context)
                .map(|c| self.assertion_count(c))
                .sum::<usize>()
    }
}
