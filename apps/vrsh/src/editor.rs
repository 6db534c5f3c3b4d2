// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Bind the vrsh completion engine to the rustyline line editor.
// Author: Lukas Bower

//! Line editor integration for interactive terminals.

use std::cell::RefCell;

use anyhow::{anyhow, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use vrsh_core::{CompletionEngine, CompletionRequest};

use crate::LineReader;

/// Rustyline helper answering tab completion from the command tree.
#[derive(Debug)]
pub struct ConsoleHelper {
    engine: RefCell<CompletionEngine>,
}

impl ConsoleHelper {
    /// Wrap a completion engine.
    pub fn new(engine: CompletionEngine) -> Self {
        Self {
            engine: RefCell::new(engine),
        }
    }

    fn pairs(&self, request: &CompletionRequest<'_>) -> Vec<Pair> {
        self.engine
            .borrow_mut()
            .candidates(request)
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.trim_end().to_owned(),
                replacement: candidate,
            })
            .collect()
    }
}

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let request = CompletionRequest::at_cursor(line, pos);
        Ok((request.begin(), self.pairs(&request)))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;
}

impl Highlighter for ConsoleHelper {}

impl Validator for ConsoleHelper {}

impl Helper for ConsoleHelper {}

/// Interactive reader backed by rustyline with history and tab completion.
pub struct EditorReader {
    editor: Editor<ConsoleHelper, DefaultHistory>,
}

impl EditorReader {
    /// Create an editor whose completion is answered by `engine`.
    pub fn new(engine: CompletionEngine) -> Result<Self> {
        let mut editor: Editor<ConsoleHelper, DefaultHistory> =
            Editor::new().map_err(|err| anyhow!("failed to init rustyline: {err}"))?;
        editor.set_helper(Some(ConsoleHelper::new(engine)));
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor
                        .add_history_entry(line.as_str())
                        .map_err(|err| anyhow!("failed to record history: {err}"))?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(err) => Err(anyhow!("readline error: {err}")),
        }
    }

    fn renders_prompt(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::MemHistory;
    use std::sync::Arc;
    use vrsh_core::{Catalog, RegistryBuilder, Strategies};

    fn helper() -> ConsoleHelper {
        let tree = Catalog::builtin().build_tree(&RegistryBuilder::default());
        ConsoleHelper::new(CompletionEngine::new(Arc::new(tree), Strategies::default()))
    }

    #[test]
    fn completes_group_members_after_the_cursor_word() {
        let helper = helper();
        let history = MemHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper.complete("reload scr", 10, &ctx).unwrap();
        assert_eq!(start, 7);
        let replacements: Vec<&str> = pairs.iter().map(|p| p.replacement.as_str()).collect();
        assert_eq!(replacements, vec!["screens "]);
        assert_eq!(pairs[0].display, "screens");
    }

    #[test]
    fn screen_set_choices_replace_the_partial_word() {
        let helper = helper();
        let history = MemHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper.complete("setScreen T", 11, &ctx).unwrap();
        assert_eq!(start, 10);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].replacement, "Troisieme");
    }
}
