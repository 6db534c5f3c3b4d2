// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Build the completion tree from registered command sources.
// Author: Lukas Bower

//! Build the completion tree from registered command sources.

use log::{debug, warn};

use crate::operation::{is_reserved, CommandSource, SourceError};
use crate::strategy::StrategyTable;
use crate::tree::{CompletionNode, CompletionTree, Namespace};

/// Builds the completion tree once at startup.
#[derive(Clone, Debug, Default)]
pub struct RegistryBuilder {
    table: StrategyTable,
}

impl RegistryBuilder {
    /// Create a builder resolving strategies through `table`.
    #[must_use]
    pub fn new(table: StrategyTable) -> Self {
        Self { table }
    }

    /// Build the tree from an ordered list of `(namespace, source)` pairs.
    ///
    /// Unnamed sources populate the root. Named sources are installed as
    /// sub-namespaces of the root and are omitted when they cannot be listed.
    pub fn build<'a, I>(&self, sources: I) -> CompletionTree
    where
        I: IntoIterator<Item = (Option<&'a str>, &'a dyn CommandSource)>,
    {
        let mut root = Namespace::new();
        let mut groups = Vec::new();
        for (name, source) in sources {
            match name {
                None => match self.build_namespace(source) {
                    Ok(namespace) => {
                        for (key, node) in namespace.iter() {
                            root.insert(key.to_owned(), node.clone());
                        }
                    }
                    Err(err) => warn!("root command source {} unavailable: {err}", source.label()),
                },
                Some(name) => groups.push((name, source)),
            }
        }

        for (name, source) in groups {
            if is_reserved(name) {
                warn!("ignoring command group with reserved name {name:?}");
                continue;
            }
            match self.build_namespace(source) {
                Ok(namespace) => {
                    if root
                        .insert(name.to_owned(), CompletionNode::Namespace(namespace))
                        .is_some()
                    {
                        debug!("command group {name} replaces a root command of the same name");
                    }
                }
                Err(err) => debug!("omitting command group {name}: {err}"),
            }
        }
        CompletionTree::from_root(root)
    }

    /// Build a single namespace from the operations of `source`.
    pub fn build_namespace(&self, source: &dyn CommandSource) -> Result<Namespace, SourceError> {
        let mut namespace = Namespace::new();
        for operation in source.operations()? {
            if is_reserved(operation.name()) {
                continue;
            }
            let node = match operation.first_argument() {
                None => CompletionNode::Terminal,
                Some(param) => CompletionNode::Strategy {
                    kind: self.table.resolve(param),
                    param: param.to_owned(),
                },
            };
            namespace.insert(operation.name().to_owned(), node);
        }
        debug!(
            "command source {} contributes {} operations",
            source.label(),
            namespace.len()
        );
        Ok(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{OperationSpec, StaticSource};
    use crate::strategy::StrategyKind;

    struct MissingSource;

    impl CommandSource for MissingSource {
        fn label(&self) -> &str {
            "missing"
        }

        fn operations(&self) -> Result<Vec<OperationSpec>, SourceError> {
            Err(SourceError::Unavailable("missing".to_owned()))
        }
    }

    #[test]
    fn reserved_and_internal_operations_are_excluded() {
        let root = StaticSource::new("root")
            .with_operation("ask", &["self", "command"])
            .with_operation("send", &["self", "command"])
            .with_operation("getConnection", &["self"])
            .with_operation("_dispatch", &["self", "line"])
            .with_operation("", &[])
            .with_operation("quit", &["self"]);
        let namespace = RegistryBuilder::default().build_namespace(&root).unwrap();
        assert_eq!(namespace.keys().collect::<Vec<_>>(), vec!["quit"]);
    }

    #[test]
    fn first_argument_selects_strategy() {
        let root = StaticSource::new("root")
            .with_operation("setScreen", &["self", "screenSet"])
            .with_operation("load", &["file"])
            .with_operation("debug", &["self", "level", "file"]);
        let namespace = RegistryBuilder::default().build_namespace(&root).unwrap();
        assert_eq!(
            namespace.get("setScreen"),
            Some(&CompletionNode::Strategy {
                kind: StrategyKind::EnumeratedChoice,
                param: "screenSet".to_owned()
            })
        );
        assert!(matches!(
            namespace.get("load"),
            Some(CompletionNode::Strategy {
                kind: StrategyKind::FilesystemPath,
                ..
            })
        ));
        assert!(matches!(
            namespace.get("debug"),
            Some(CompletionNode::Strategy {
                kind: StrategyKind::Noop,
                ..
            })
        ));
    }

    #[test]
    fn custom_table_is_consulted_at_build_time() {
        let root = StaticSource::new("root").with_operation("debugLevel", &["self", "level"]);
        let table = StrategyTable::default().with_entry("level", StrategyKind::EnumeratedChoice);
        let namespace = RegistryBuilder::new(table).build_namespace(&root).unwrap();
        assert!(matches!(
            namespace.get("debugLevel"),
            Some(CompletionNode::Strategy {
                kind: StrategyKind::EnumeratedChoice,
                ..
            })
        ));
    }

    #[test]
    fn failing_groups_are_omitted() {
        let root = StaticSource::new("root").with_operation("quit", &["self"]);
        let get = StaticSource::new("get").with_operation("status", &["self"]);
        let tree = RegistryBuilder::default().build([
            (None, &root as &dyn CommandSource),
            (Some("reload"), &MissingSource as &dyn CommandSource),
            (Some("get"), &get as &dyn CommandSource),
        ]);
        assert_eq!(tree.root().keys().collect::<Vec<_>>(), vec!["get", "quit"]);
    }

    #[test]
    fn failing_root_leaves_groups_intact() {
        let set = StaticSource::new("set").with_operation("value", &["x"]);
        let tree = RegistryBuilder::default().build([
            (None, &MissingSource as &dyn CommandSource),
            (Some("set"), &set as &dyn CommandSource),
        ]);
        assert_eq!(tree.root().keys().collect::<Vec<_>>(), vec!["set"]);
    }

    #[test]
    fn reserved_group_names_are_rejected() {
        let group = StaticSource::new("bad").with_operation("value", &["x"]);
        let tree = RegistryBuilder::default().build([
            (Some("_hidden"), &group as &dyn CommandSource),
            (Some("send"), &group as &dyn CommandSource),
        ]);
        assert!(tree.root().is_empty());
    }
}
