// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Command registry and completion grammar for the vrsh console.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Command registry and completion grammar for the vrsh console.
//!
//! The registry builder turns the controller's command groups into a
//! read-only [`CompletionTree`] once at startup; the [`CompletionEngine`] walks
//! that tree for every completion request issued by the line editor.

pub mod catalog;
pub mod complete;
pub mod operation;
pub mod registry;
pub mod strategy;
pub mod token;
pub mod tree;

pub use catalog::{Catalog, CatalogError, CatalogSource, IncludeSource};
pub use complete::{CompletionEngine, CompletionError, CompletionRequest};
pub use operation::{
    is_reserved, CommandSource, OperationSpec, SourceError, StaticSource, INTERNAL_MARKER,
    RECEIVER_PARAM, RESERVED_OPERATIONS,
};
pub use registry::RegistryBuilder;
pub use strategy::{
    complete_choices, complete_path, Strategies, StrategyKind, StrategyTable,
    DEFAULT_SCREEN_SETS, FILE_PARAM, SCREEN_SET_PARAM,
};
pub use token::{tokenize, word_start, CommandLine, InputLine, Resolution, WORD_DELIMITERS};
pub use tree::{CommandUsage, CompletionNode, CompletionTree, Namespace};
