// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Static registration of the controller command groups.
// Author: Lukas Bower

//! Static registration of the controller command groups.
//!
//! The built-in catalog mirrors the controller protocol: a root group plus the
//! `set`, `get` and `reload` groups. Operators may replace it with a TOML
//! catalog whose groups are either inline or included from separate files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::operation::{CommandSource, OperationSpec, SourceError, StaticSource};
use crate::registry::RegistryBuilder;
use crate::tree::CompletionTree;

/// Errors raised while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Catalog path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog is not valid TOML for the expected schema.
    #[error("invalid catalog {path}: {source}")]
    Parse {
        /// Catalog path.
        path: PathBuf,
        /// TOML diagnostic.
        #[source]
        source: toml::de::Error,
    },
    /// A group declares both inline operations and an include.
    #[error("catalog group {0} mixes inline operations with an include")]
    MixedGroup(String),
    /// A group or operation name contains whitespace and could never be typed.
    #[error("catalog group {group} declares the untypeable name {name:?}")]
    InvalidName {
        /// Group declaring the name.
        group: String,
        /// Offending group or operation name.
        name: String,
    },
}

/// Command source backed by a catalog entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogSource {
    /// Operations declared inline.
    Inline(StaticSource),
    /// Operations read from a separate file when the tree is built.
    Include(IncludeSource),
}

impl CommandSource for CatalogSource {
    fn label(&self) -> &str {
        match self {
            Self::Inline(source) => source.label(),
            Self::Include(source) => source.label(),
        }
    }

    fn operations(&self) -> Result<Vec<OperationSpec>, SourceError> {
        match self {
            Self::Inline(source) => source.operations(),
            Self::Include(source) => source.operations(),
        }
    }
}

/// Command group definitions loaded from a TOML file on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeSource {
    label: String,
    path: PathBuf,
}

impl IncludeSource {
    /// Reference the group definitions stored at `path`.
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }

    /// Return the definition file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandSource for IncludeSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn operations(&self) -> Result<Vec<OperationSpec>, SourceError> {
        let text = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let parsed: IncludeToml = toml::from_str(&text).map_err(|err| SourceError::Invalid {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        if let Some(bad) = parsed.operations.iter().find(|op| is_untypeable(&op.name)) {
            return Err(SourceError::Invalid {
                path: self.path.clone(),
                message: format!("operation name {:?} contains whitespace", bad.name),
            });
        }
        Ok(parsed.operations.into_iter().map(OperationToml::into_spec).collect())
    }
}

/// Root command source plus named command groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    root: CatalogSource,
    groups: Vec<(String, CatalogSource)>,
}

impl Catalog {
    /// Create a catalog from its root source.
    #[must_use]
    pub fn new(root: CatalogSource) -> Self {
        Self {
            root,
            groups: Vec::new(),
        }
    }

    /// Register a named command group.
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>, source: CatalogSource) -> Self {
        self.groups.push((name.into(), source));
        self
    }

    /// Catalog matching the controller protocol shipped with vrsh.
    #[must_use]
    pub fn builtin() -> Self {
        let root = StaticSource::new("root")
            .with_operation("ask", &["self", "command"])
            .with_operation("getConnection", &["self"])
            .with_operation("send", &["self", "command"])
            .with_operation("_dispatch", &["self", "line"])
            .with_operation("quit", &["self"])
            .with_operation("start", &["self"])
            .with_operation("stop", &["self"])
            .with_operation("status", &["self"])
            .with_operation("setScreen", &["self", "screenSet"])
            .with_operation("load", &["self", "file"]);
        let set = StaticSource::new("set")
            .with_operation("blenderFile", &["self", "file"])
            .with_operation("processorFile", &["self", "file"])
            .with_operation("screenSet", &["self", "screenSet"])
            .with_operation("debugLevel", &["self", "level"]);
        let get = StaticSource::new("get")
            .with_operation("status", &["self"])
            .with_operation("screenSets", &["self"])
            .with_operation("version", &["self"])
            .with_operation("processorFile", &["self"]);
        let reload = StaticSource::new("reload")
            .with_operation("processor", &["self"])
            .with_operation("configuration", &["self"])
            .with_operation("screens", &["self"]);
        Self::new(CatalogSource::Inline(root))
            .with_group("set", CatalogSource::Inline(set))
            .with_group("get", CatalogSource::Inline(get))
            .with_group("reload", CatalogSource::Inline(reload))
    }

    /// Load a catalog file; includes resolve relative to its directory.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base).map_err(|err| match err {
            CatalogError::Parse { source, .. } => CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse catalog TOML; relative includes resolve against `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Self, CatalogError> {
        let parsed: CatalogToml = toml::from_str(text).map_err(|source| CatalogError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        let root = parsed.root.into_source("root", base)?;
        let mut catalog = Self::new(root);
        for (name, section) in parsed.groups {
            let source = section.into_source(&name, base)?;
            catalog.groups.push((name, source));
        }
        Ok(catalog)
    }

    /// Return the root source.
    #[must_use]
    pub fn root(&self) -> &CatalogSource {
        &self.root
    }

    /// Return the named groups; built-in groups keep registration order, parsed
    /// catalogs list them alphabetically.
    #[must_use]
    pub fn groups(&self) -> &[(String, CatalogSource)] {
        &self.groups
    }

    /// Return the ordered `(namespace, source)` list consumed by the registry builder.
    #[must_use]
    pub fn sources(&self) -> Vec<(Option<&str>, &dyn CommandSource)> {
        let root: &dyn CommandSource = &self.root;
        let mut sources = vec![(None, root)];
        for (name, source) in &self.groups {
            sources.push((Some(name.as_str()), source as &dyn CommandSource));
        }
        sources
    }

    /// Build the completion tree for this catalog.
    #[must_use]
    pub fn build_tree(&self, builder: &RegistryBuilder) -> CompletionTree {
        builder.build(self.sources())
    }
}

fn is_untypeable(name: &str) -> bool {
    name.chars().any(char::is_whitespace)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogToml {
    root: SectionToml,
    #[serde(default)]
    groups: BTreeMap<String, SectionToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionToml {
    #[serde(default)]
    operations: Vec<OperationToml>,
    include: Option<PathBuf>,
}

impl SectionToml {
    fn into_source(self, name: &str, base: &Path) -> Result<CatalogSource, CatalogError> {
        let untypeable = std::iter::once(name)
            .chain(self.operations.iter().map(|op| op.name.as_str()))
            .find(|candidate| is_untypeable(candidate));
        if let Some(bad) = untypeable {
            return Err(CatalogError::InvalidName {
                group: name.to_owned(),
                name: bad.to_owned(),
            });
        }
        match self.include {
            Some(_) if !self.operations.is_empty() => Err(CatalogError::MixedGroup(name.to_owned())),
            Some(include) => Ok(CatalogSource::Include(IncludeSource::new(
                name,
                base.join(include),
            ))),
            None => {
                let mut source = StaticSource::new(name);
                for operation in self.operations {
                    source.push(operation.into_spec());
                }
                Ok(CatalogSource::Inline(source))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IncludeToml {
    #[serde(default)]
    operations: Vec<OperationToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OperationToml {
    name: String,
    #[serde(default)]
    params: Vec<String>,
}

impl OperationToml {
    fn into_spec(self) -> OperationSpec {
        OperationSpec::new(self.name, self.params)
    }
}
