// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Argument completion strategies and their parameter-name lookup.
// Author: Lukas Bower

//! Argument completion strategies and their parameter-name lookup.

use std::path::MAIN_SEPARATOR;

use crate::complete::{CompletionError, CompletionRequest};

/// Parameter name completed from the configured screen sets.
pub const SCREEN_SET_PARAM: &str = "screenSet";
/// Parameter name completed from the local filesystem.
pub const FILE_PARAM: &str = "file";

/// Screen sets offered when no configuration overrides them.
pub const DEFAULT_SCREEN_SETS: [&str; 4] = ["Premier", "Second", "Troisieme", "Quatrieme"];

/// Completion strategy attached to a single-argument command.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StrategyKind {
    /// Fixed list of choices.
    EnumeratedChoice,
    /// Paths on the local filesystem.
    FilesystemPath,
    /// Argument without completion support.
    Noop,
}

/// Lookup table from a first-parameter name to its strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyTable {
    entries: Vec<(String, StrategyKind)>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::empty()
            .with_entry(SCREEN_SET_PARAM, StrategyKind::EnumeratedChoice)
            .with_entry(FILE_PARAM, StrategyKind::FilesystemPath)
    }
}

impl StrategyTable {
    /// Create a table without any entries; every parameter resolves to `Noop`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register or replace the strategy for `param`.
    #[must_use]
    pub fn with_entry(mut self, param: &str, kind: StrategyKind) -> Self {
        match self.entries.iter_mut().find(|(name, _)| name == param) {
            Some(entry) => entry.1 = kind,
            None => self.entries.push((param.to_owned(), kind)),
        }
        self
    }

    /// Resolve the strategy for a parameter name.
    #[must_use]
    pub fn resolve(&self, param: &str) -> StrategyKind {
        self.entries
            .iter()
            .find(|(name, _)| name == param)
            .map_or(StrategyKind::Noop, |(_, kind)| *kind)
    }
}

/// Runtime data backing the strategies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strategies {
    choices: Vec<String>,
}

impl Default for Strategies {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN_SETS.iter().map(|label| (*label).to_owned()))
    }
}

impl Strategies {
    /// Build the strategies from the enumerated choice list.
    pub fn new<I>(choices: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            choices: choices.into_iter().collect(),
        }
    }

    /// Run `kind` against the words following the command.
    pub fn run(
        &self,
        kind: StrategyKind,
        words: &[&str],
        request: &CompletionRequest<'_>,
    ) -> Result<Vec<String>, CompletionError> {
        match kind {
            StrategyKind::EnumeratedChoice => Ok(complete_choices(&self.choices, words)),
            StrategyKind::FilesystemPath => complete_path(request),
            StrategyKind::Noop => Ok(Vec::new()),
        }
    }
}

/// Return every choice starting with the first word, or all choices when no word was typed.
#[must_use]
pub fn complete_choices(choices: &[String], words: &[&str]) -> Vec<String> {
    let Some(prefix) = words.first() else {
        return choices.to_vec();
    };
    choices
        .iter()
        .filter(|choice| !choice.is_empty() && choice.starts_with(prefix))
        .cloned()
        .collect()
}

/// Complete a filesystem path argument from the raw line and cursor offsets.
///
/// The argument begins after the last space preceding `begin`. Everything
/// between that point and `begin` was already typed and is stripped from the
/// returned candidates, so only the part replacing `begin..end` remains.
pub fn complete_path(request: &CompletionRequest<'_>) -> Result<Vec<String>, CompletionError> {
    let line = request.line();
    let head = request.slice(0, request.begin())?;
    let Some(space) = head.rfind(' ') else {
        return Ok(Vec::new());
    };
    let arg_start = space + 1;
    let fixed = request.slice(arg_start, request.begin())?;
    let arg = request.slice(arg_start, request.end())?;
    let pattern = format!("{}*", glob::Pattern::escape(arg));
    log::debug!("path completion for {line:?} using pattern {pattern:?}");

    let mut completions = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        let mut text = path.to_string_lossy().into_owned();
        if text.is_empty() {
            continue;
        }
        if path.is_dir() && !text.ends_with(MAIN_SEPARATOR) {
            text.push(MAIN_SEPARATOR);
        }
        completions.push(text.replacen(fixed, "", 1));
    }
    Ok(completions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen_sets() -> Vec<String> {
        DEFAULT_SCREEN_SETS.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn table_resolves_known_parameters() {
        let table = StrategyTable::default();
        assert_eq!(table.resolve("screenSet"), StrategyKind::EnumeratedChoice);
        assert_eq!(table.resolve("file"), StrategyKind::FilesystemPath);
        assert_eq!(table.resolve("level"), StrategyKind::Noop);
    }

    #[test]
    fn table_entries_can_be_replaced() {
        let table = StrategyTable::default().with_entry("file", StrategyKind::Noop);
        assert_eq!(table.resolve("file"), StrategyKind::Noop);
        assert_eq!(StrategyTable::empty().resolve("screenSet"), StrategyKind::Noop);
    }

    #[test]
    fn choices_without_word_are_exhaustive() {
        let choices = screen_sets();
        assert_eq!(complete_choices(&choices, &[]), choices);
    }

    #[test]
    fn choices_filter_on_first_word() {
        let choices = screen_sets();
        assert_eq!(complete_choices(&choices, &["Pr"]), vec!["Premier"]);
        assert_eq!(complete_choices(&choices, &["Q", "ignored"]), vec!["Quatrieme"]);
        assert!(complete_choices(&choices, &["x"]).is_empty());
    }

    #[test]
    fn path_without_argument_boundary_is_empty() {
        let request = CompletionRequest::new("load", 4, 4);
        assert!(complete_path(&request).unwrap().is_empty());
    }
}
