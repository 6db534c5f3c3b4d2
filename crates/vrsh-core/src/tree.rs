// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Read-only completion tree built from controller command sources.
// Author: Lukas Bower

//! Read-only completion tree built from controller command sources.

use std::collections::BTreeMap;
use std::fmt;

use crate::strategy::StrategyKind;

/// Node of the completion tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionNode {
    /// Command without arguments.
    Terminal,
    /// Nested command group.
    Namespace(Namespace),
    /// Command whose single argument is completed by a strategy.
    Strategy {
        /// Strategy selected from the parameter name.
        kind: StrategyKind,
        /// Declared parameter name.
        param: String,
    },
}

impl CompletionNode {
    /// Return the nested namespace when this node is a command group.
    #[must_use]
    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Self::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }
}

/// Mapping from command name to completion node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespace {
    entries: BTreeMap<String, CompletionNode>,
}

impl Namespace {
    /// Create an empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: String, node: CompletionNode) -> Option<CompletionNode> {
        self.entries.insert(name, node)
    }

    /// Look up a direct child by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CompletionNode> {
        self.entries.get(name)
    }

    /// Iterate child names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate children in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompletionNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true when the namespace has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Completion tree rooted at the controller's top-level namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionTree {
    root: Namespace,
}

impl CompletionTree {
    pub(crate) fn from_root(root: Namespace) -> Self {
        Self { root }
    }

    /// Return the root namespace.
    #[must_use]
    pub fn root(&self) -> &Namespace {
        &self.root
    }

    /// Resolve a command path by exact names.
    #[must_use]
    pub fn lookup(&self, path: &[&str]) -> Option<&CompletionNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(first)?;
        for name in rest {
            node = node.as_namespace()?.get(name)?;
        }
        Some(node)
    }

    /// Flatten the tree into one usage entry per command, depth first.
    #[must_use]
    pub fn commands(&self) -> Vec<CommandUsage> {
        let mut usages = Vec::new();
        collect_usages(&self.root, &mut Vec::new(), &mut usages);
        usages
    }
}

fn collect_usages(namespace: &Namespace, prefix: &mut Vec<String>, out: &mut Vec<CommandUsage>) {
    for (name, node) in namespace.iter() {
        prefix.push(name.to_owned());
        match node {
            CompletionNode::Terminal => out.push(CommandUsage {
                path: prefix.clone(),
                argument: None,
            }),
            CompletionNode::Strategy { param, .. } => out.push(CommandUsage {
                path: prefix.clone(),
                argument: Some(param.clone()),
            }),
            CompletionNode::Namespace(child) => collect_usages(child, prefix, out),
        }
        prefix.pop();
    }
}

/// Usage line for a single command in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandUsage {
    /// Namespace names followed by the command name.
    pub path: Vec<String>,
    /// Declared argument, if the command takes one.
    pub argument: Option<String>,
}

impl fmt::Display for CommandUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join(" "))?;
        if let Some(argument) = &self.argument {
            write!(f, " <{argument}>")?;
        }
        Ok(())
    }
}
