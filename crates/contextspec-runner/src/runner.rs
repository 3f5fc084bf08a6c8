//! Runner Facade: discovery, resolution and execution behind one type.

use std::fmt;

use contextspec_discovery::{build, BuildResult};
use contextspec_types::{
    ContextClass, ContextTree, Description, InitializationError, InitializationErrors,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::describe::describe;
use crate::engine::{ExampleOutcome, ExampleState, ExecutionEngine};
use crate::notifier::Notifier;
use crate::resolver::{resolve, Example};

/// A discovered and resolved run, ready to describe and execute.
pub struct Runner {
    tree: ContextTree,
    examples: Vec<Example>,
    config: RunConfig,
}

impl Runner {
    /// Discover and resolve `root` with the default configuration.
    pub fn new(root: &ContextClass) -> Result<Self, InitializationErrors> {
        Self::with_config(root, RunConfig::default())
    }

    pub fn with_config(
        root: &ContextClass,
        config: RunConfig,
    ) -> Result<Self, InitializationErrors> {
        let BuildResult { tree, errors } = build(root);
        // A malformed tree is never instantiated.
        let examples = if errors.is_empty() {
            resolve(&tree)
        } else {
            Vec::new()
        };
        Self::from_parts(tree, examples, errors, config)
    }

    /// Assemble a runner from an already built tree and its examples.
    ///
    /// Fails with every error in `errors`, followed by a no-examples error
    /// when the tree declares no assertion at all.
    pub fn from_parts(
        tree: ContextTree,
        examples: Vec<Example>,
        mut errors: InitializationErrors,
        config: RunConfig,
    ) -> Result<Self, InitializationErrors> {
        if tree.assertion_count(tree.root()) == 0 {
            errors.push(InitializationError::NoExamples {
                context: tree.root().name().to_string(),
            });
        }
        if !errors.is_empty() {
            warn!(
                root = tree.root().name(),
                errors = errors.len(),
                "run initialization failed"
            );
            return Err(errors);
        }

        debug!(
            root = tree.root().name(),
            examples = examples.len(),
            "runner ready"
        );
        Ok(Self {
            tree,
            examples,
            config,
        })
    }

    /// Number of resolved examples, pending ones included.
    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn tree(&self) -> &ContextTree {
        &self.tree
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn description(&self) -> Description {
        describe(&self.tree, &self.examples)
            .unwrap_or_else(|| Description::suite(self.tree.root().path.clone(), Vec::new()))
    }

    /// Run every example in description order.
    pub fn run(&self, notifier: &mut dyn Notifier) -> RunSummary {
        let engine = ExecutionEngine::new();
        let outcomes = self
            .examples
            .iter()
            .map(|example| {
                let skip = self.config.is_skipped(&example.id);
                engine.run(example, skip, notifier)
            })
            .collect();
        let summary = RunSummary::from_outcomes(outcomes);
        info!(
            passed = summary.passed,
            failed = summary.failed,
            ignored = summary.ignored,
            "run finished"
        );
        summary
    }
}

/// Outcomes of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<ExampleOutcome>,
    pub passed: usize,
    pub failed: usize,
    pub ignored: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: Vec<ExampleOutcome>) -> Self {
        let count = |state: ExampleState| outcomes.iter().filter(|o| o.state == state).count();
        let passed = count(ExampleState::Passed);
        let failed = count(ExampleState::Failed);
        let ignored = count(ExampleState::Skipped);
        Self {
            outcomes,
            passed,
            failed,
            ignored,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match (&outcome.state, &outcome.failure) {
                (ExampleState::Failed, Some(failure)) => {
                    writeln!(f, "  ✗ {} — {}", outcome.id, failure.primary)?;
                    for suppressed in &failure.suppressed {
                        writeln!(f, "      also: {suppressed}")?;
                    }
                }
                (ExampleState::Skipped, _) => writeln!(f, "  - {} (ignored)", outcome.id)?,
                _ => writeln!(f, "  ✓ {}", outcome.id)?,
            }
        }
        writeln!(
            f,
            "\n{} passed, {} failed, {} ignored",
            self.passed, self.failed, self.ignored
        )
    }
}
