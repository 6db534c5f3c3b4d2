// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Command definitions consumed by the vrsh registry builder.
// Author: Lukas Bower

//! Command definitions consumed by the vrsh registry builder.
//!
//! Each controller command group is exposed through a [`CommandSource`] that
//! lists its operations and their declared parameters. The registry builder
//! only looks at operation names and the first declared argument.

use std::path::PathBuf;

use thiserror::Error;

/// Operation names reserved for the controller connection itself.
pub const RESERVED_OPERATIONS: [&str; 3] = ["ask", "getConnection", "send"];

/// Prefix marking operations internal to a command source.
pub const INTERNAL_MARKER: char = '_';

/// Implicit receiver parameter skipped when resolving the first argument.
pub const RECEIVER_PARAM: &str = "self";

/// Declared shape of a single controller operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationSpec {
    name: String,
    params: Vec<String>,
}

impl OperationSpec {
    /// Construct an operation from its name and declared parameters.
    pub fn new<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Return the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the declared parameters, receiver included.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Return the declared parameters with a leading receiver removed.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        match self.params.split_first() {
            Some((first, rest)) if first == RECEIVER_PARAM => rest,
            _ => &self.params,
        }
    }

    /// Return the first argument name, which selects the completion strategy.
    #[must_use]
    pub fn first_argument(&self) -> Option<&str> {
        self.arguments().first().map(String::as_str)
    }
}

/// Return true when `name` must never appear in a completion namespace.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    name.is_empty() || name.starts_with(INTERNAL_MARKER) || RESERVED_OPERATIONS.contains(&name)
}

/// Errors raised while listing the operations of a command source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source is not provided by this controller build.
    #[error("command source {0} is unavailable")]
    Unavailable(String),
    /// The backing definition file could not be read.
    #[error("failed to read command source {path}: {source}")]
    Io {
        /// Path of the definition file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The backing definition file is malformed.
    #[error("invalid command source {path}: {message}")]
    Invalid {
        /// Path of the definition file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// Capability listing the operations exposed by one controller command group.
pub trait CommandSource {
    /// Human readable label used in diagnostics.
    fn label(&self) -> &str;

    /// List the operations declared by this source.
    fn operations(&self) -> Result<Vec<OperationSpec>, SourceError>;
}

/// In-memory command source registered at build time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticSource {
    label: String,
    operations: Vec<OperationSpec>,
}

impl StaticSource {
    /// Create an empty source with the supplied label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            operations: Vec::new(),
        }
    }

    /// Builder-style registration of an operation.
    #[must_use]
    pub fn with_operation(mut self, name: &str, params: &[&str]) -> Self {
        self.push(OperationSpec::new(name, params.iter().copied()));
        self
    }

    /// Register an operation.
    pub fn push(&mut self, operation: OperationSpec) {
        self.operations.push(operation);
    }
}

impl CommandSource for StaticSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn operations(&self) -> Result<Vec<OperationSpec>, SourceError> {
        Ok(self.operations.clone())
    }
}
