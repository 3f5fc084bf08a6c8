//! Description Builder: the suite/test tree reporting tools render.

use std::collections::HashMap;

use contextspec_types::{Context, ContextId, ContextTree, Description};

use crate::resolver::Example;

/// Build the description for `examples` resolved from `tree`.
///
/// Each suite lists its child suites in declaration order, then its own
/// tests. Contexts without any example below them are left out,
/// so `None` means nothing in the tree resolved to an example.
pub fn describe(tree: &ContextTree, examples: &[Example]) -> Option<Description> {
    let mut by_context: HashMap<ContextId, Vec<&Example>> = HashMap::new();
    for example in examples {
        by_context.entry(example.context).or_default().push(example);
    }
    describe_context(tree, tree.root(), &by_context)
}

fn describe_context(
    tree: &ContextTree,
    context: &Context,
    by_context: &HashMap<ContextId, Vec<&Example>>,
) -> Option<Description> {
    let mut children: Vec<Description> = tree
        .children(context)
        .filter_map(|child| describe_context(tree, child, by_context))
        .collect();
    children.extend(
        by_context
            .get(&context.id)
            .into_iter()
            .flatten()
            .map(|example| Description::test(example.id.clone())),
    );

    if children.is_empty() {
        None
    } else {
        Some(Description::suite(context.path.clone(), children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use contextspec_discovery::build;
    use contextspec_types::{ContextClass, ContextPath, It};

    struct Root;
    struct Middle;
    struct Leaf {
        works: It,
    }

    #[test]
    fn test_empty_intermediate_context_still_nests_its_examples() {
        let class = ContextClass::root("Root", || Root).context(
            ContextClass::nested("middle", |_: &Root| Middle).context(
                ContextClass::nested("leaf", |_: &Middle| Leaf {
                    works: It::new(|| ()),
                })
                .field("works", |l: &Leaf| &l.works),
            ),
        );
        let tree = build(&class).tree;
        let examples = resolve(&tree);
        let root = describe(&tree, &examples).unwrap();

        assert_eq!(root.display_name(), "Root");
        let middle = &root.children()[0];
        assert_eq!(middle.display_name(), "middle");
        let leaf = &middle.children()[0];
        assert_eq!(leaf.display_name(), "leaf");
        assert_eq!(leaf.children().len(), 1);
        assert!(leaf.children()[0].is_test());
        assert_eq!(root.test_count(), 1);
    }

    #[test]
    fn test_child_suites_come_before_own_tests() {
        let class = ContextClass::root("Root", || Leaf {
            works: It::new(|| ()),
        })
        .context(
            ContextClass::nested("child", |_: &Leaf| Leaf {
                works: It::new(|| ()),
            })
            .field("works", |l: &Leaf| &l.works),
        )
        .field("works", |l: &Leaf| &l.works);
        let tree = build(&class).tree;
        let root = describe(&tree, &resolve(&tree)).unwrap();

        let names: Vec<&str> = root.children().iter().map(Description::display_name).collect();
        assert_eq!(names, ["child", "works"]);
        assert!(root.children()[0].is_suite());
        assert!(root.children()[1].is_test());
    }

    #[test]
    fn test_contexts_without_examples_are_omitted() {
        let class = ContextClass::root("Root", || Leaf {
            works: It::new(|| ()),
        })
        .field("works", |l: &Leaf| &l.works)
        .context(ContextClass::standalone("empty", || Middle));
        let tree = build(&class).tree;
        let root = describe(&tree, &resolve(&tree)).unwrap();

        assert!(root.find_suite(&ContextPath::parse("Root/empty")).is_none());
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_tree_without_examples_has_no_description() {
        let tree = build(&ContextClass::root("Root", || Root)).tree;
        assert!(describe(&tree, &resolve(&tree)).is_none());
    }
}
