//! The suite/test hierarchy handed to reporting tools.

use serde::{Deserialize, Serialize};

use crate::{ContextPath, ExampleId};

/// A node of the description tree.
///
/// Suites mirror contexts that own at least one example, directly or
/// through descendants. Tests mirror examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Description {
    Suite {
        path: ContextPath,
        display_name: String,
        children: Vec<Description>,
    },
    Test {
        id: ExampleId,
        display_name: String,
    },
}

impl Description {
    pub fn suite(path: ContextPath, children: Vec<Description>) -> Self {
        Self::Suite {
            display_name: path.name().to_string(),
            path,
            children,
        }
    }

    pub fn test(id: ExampleId) -> Self {
        Self::Test {
            display_name: id.name.clone(),
            id,
        }
    }

    pub fn is_suite(&self) -> bool {
        matches!(self, Self::Suite { .. })
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Self::Test { .. })
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Suite { display_name, .. } | Self::Test { display_name, .. } => display_name,
        }
    }

    pub fn children(&self) -> &[Description] {
        match self {
            Self::Suite { children, .. } => children,
            Self::Test { .. } => &[],
        }
    }

    /// Number of test nodes in this subtree.
    pub fn test_count(&self) -> usize {
        match self {
            Self::Suite { children, .. } => children.iter().map(Description::test_count).sum(),
            Self::Test { .. } => 1,
        }
    }

    /// Find the test node for `id` anywhere in this subtree.
    pub fn find_test(&self, id: &ExampleId) -> Option<&Description> {
        match self {
            Self::Test { id: own, .. } if own == id => Some(self),
            Self::Test { .. } => None,
            Self::Suite { children, .. } => children.iter().find_map(|c| c.find_test(id)),
        }
    }

    /// Find the suite node for `path` anywhere in this subtree.
    pub fn find_suite(&self, path: &ContextPath) -> Option<&Description> {
        match self {
            Self::Suite { path: own, .. } if own == path => Some(self),
            Self::Suite { children, .. } => children.iter().find_map(|c| c.find_suite(path)),
            Self::Test { .. } => None,
        }
    }

    /// Pretty-printed JSON for external reporters.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
