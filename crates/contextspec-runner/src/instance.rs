//! Instance Graph Builder: materializes the runtime object behind each
//! context, outer contexts first.
//!
//! One graph lives for one resolution pass. Every context is constructed at
//! most once per pass, and siblings sharing an ancestor observe the same
//! ancestor instance. Failures are cached too: a context whose constructor
//! failed fails every context nested inside it with the same error.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use contextspec_types::{
    BehaviorError, ConstructionError, Context, ContextId, ContextTree, Instance,
};
use tracing::{debug, trace, warn};

use crate::error::InstanceError;

pub struct InstanceGraph<'t> {
    tree: &'t ContextTree,
    cache: HashMap<ContextId, Result<Instance, InstanceError>>,
    constructed: usize,
}

impl<'t> InstanceGraph<'t> {
    pub fn new(tree: &'t ContextTree) -> Self {
        Self {
            tree,
            cache: HashMap::new(),
            constructed: 0,
        }
    }

    /// The instance backing `context`, constructing it and its ancestors on
    /// first use.
    pub fn instance_for(&mut self, context: &Context) -> Result<Instance, InstanceError> {
        if let Some(cached) = self.cache.get(&context.id) {
            trace!(context = %context.path, "instance cache hit");
            return cached.clone();
        }

        let result = self.materialize(context);
        self.cache.insert(context.id, result.clone());
        result
    }

    fn materialize(&mut self, context: &Context) -> Result<Instance, InstanceError> {
        let tree = self.tree;
        let enclosing = match tree.parent(context) {
            Some(parent) if !context.stands_alone() => Some(self.instance_for(parent)?),
            _ => None,
        };

        let constructor = context.constructor.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| constructor(enclosing.as_ref())))
            .unwrap_or_else(|payload| {
                Err(ConstructionError::Failed(BehaviorError::from_panic(payload)))
            });
        self.constructed += 1;

        match outcome {
            Ok(instance) => {
                debug!(context = %context.path, "constructed context instance");
                Ok(instance)
            }
            Err(source) => {
                warn!(context = %context.path, error = %source, "context construction failed");
                Err(InstanceError {
                    context: context.path.clone(),
                    source,
                })
            }
        }
    }

    /// Number of constructor calls made so far, successful or not.
    pub fn constructed_count(&self) -> usize {
        self.constructed
    }
}
