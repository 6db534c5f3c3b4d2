// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Recursive completion engine over the vrsh command tree.
// Author: Lukas Bower

//! Recursive completion engine over the vrsh command tree.
//!
//! Earlier words must match a command name exactly to descend; the word under
//! the cursor is prefix matched. Commands taking an argument hand the remaining
//! words to their strategy.

use std::error::Error as StdError;
use std::sync::Arc;

use log::error;
use thiserror::Error;

use crate::strategy::Strategies;
use crate::token::{word_start, InputLine};
use crate::tree::{CompletionNode, CompletionTree, Namespace};

/// Errors raised while computing candidates.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The request offsets do not fall on character boundaries of the line.
    #[error("completion offsets {begin}..{end} are invalid for a {len} byte line")]
    Offsets {
        /// Requested start offset.
        begin: usize,
        /// Requested end offset.
        end: usize,
        /// Line length in bytes.
        len: usize,
    },
    /// The path argument produced an invalid glob pattern.
    #[error("invalid path pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// A directory could not be listed.
    #[error("failed to list path candidates: {0}")]
    Glob(#[from] glob::GlobError),
}

/// Line buffer and cursor offsets for a completion request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionRequest<'a> {
    line: &'a str,
    begin: usize,
    end: usize,
}

impl<'a> CompletionRequest<'a> {
    /// Create a request for the word spanning `begin..end`.
    #[must_use]
    pub fn new(line: &'a str, begin: usize, end: usize) -> Self {
        Self { line, begin, end }
    }

    /// Create a request for the word ending at the cursor.
    #[must_use]
    pub fn at_cursor(line: &'a str, cursor: usize) -> Self {
        Self::new(line, word_start(line, cursor), cursor)
    }

    /// Create a request with the cursor at the end of the line.
    #[must_use]
    pub fn at_end(line: &'a str) -> Self {
        Self::at_cursor(line, line.len())
    }

    /// Return the full line buffer.
    #[must_use]
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// Return the start offset of the word being completed.
    #[must_use]
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Return the cursor offset.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Return `line[start..stop]`, rejecting offsets that split a character.
    pub fn slice(&self, start: usize, stop: usize) -> Result<&'a str, CompletionError> {
        self.line
            .get(start..stop)
            .ok_or(CompletionError::Offsets {
                begin: start,
                end: stop,
                len: self.line.len(),
            })
    }
}

#[derive(Debug)]
struct Memo {
    line: String,
    begin: usize,
    end: usize,
    matches: Vec<String>,
}

impl Memo {
    fn covers(&self, request: &CompletionRequest<'_>) -> bool {
        self.line == request.line() && self.begin == request.begin() && self.end == request.end()
    }
}

/// Completion engine owning the read-only tree and the last match list.
#[derive(Debug)]
pub struct CompletionEngine {
    tree: Arc<CompletionTree>,
    strategies: Strategies,
    memo: Option<Memo>,
}

impl CompletionEngine {
    /// Create an engine over `tree`.
    #[must_use]
    pub fn new(tree: Arc<CompletionTree>, strategies: Strategies) -> Self {
        Self {
            tree,
            strategies,
            memo: None,
        }
    }

    /// Return the tree driving completion.
    #[must_use]
    pub fn tree(&self) -> &CompletionTree {
        &self.tree
    }

    /// Return the sorted candidates for `request`, reusing the memo for repeated requests.
    ///
    /// Failures are logged and reported as an empty candidate list.
    pub fn candidates(&mut self, request: &CompletionRequest<'_>) -> Vec<String> {
        if let Some(memo) = self.memo.as_ref().filter(|memo| memo.covers(request)) {
            return memo.matches.clone();
        }
        self.refresh(request).to_vec()
    }

    /// Return the `state`th candidate; state zero always rebuilds the match list.
    pub fn candidate(&mut self, request: &CompletionRequest<'_>, state: usize) -> Option<String> {
        let stale = self
            .memo
            .as_ref()
            .map_or(true, |memo| !memo.covers(request));
        if state == 0 || stale {
            self.refresh(request);
        }
        self.memo
            .as_ref()
            .and_then(|memo| memo.matches.get(state).cloned())
    }

    /// Compute sorted, deduplicated candidates without touching the memo.
    pub fn matches(&self, request: &CompletionRequest<'_>) -> Result<Vec<String>, CompletionError> {
        let typed = request.slice(0, request.end())?;
        let input = InputLine::parse(typed.trim_start());
        let root = self.tree.root();
        let mut matches = self.descend_namespace(root, input.words(), input.has_partial(), request)?;
        matches.sort();
        matches.dedup();
        Ok(matches)
    }

    fn refresh(&mut self, request: &CompletionRequest<'_>) -> &[String] {
        let matches = match self.matches(request) {
            Ok(matches) => matches,
            Err(err) => {
                error!(
                    "completion failed for {:?}: {}",
                    request.line(),
                    render_chain(&err)
                );
                Vec::new()
            }
        };
        let memo = self.memo.insert(Memo {
            line: request.line().to_owned(),
            begin: request.begin(),
            end: request.end(),
            matches,
        });
        &memo.matches
    }

    fn descend(
        &self,
        node: &CompletionNode,
        words: &[&str],
        partial: bool,
        request: &CompletionRequest<'_>,
    ) -> Result<Vec<String>, CompletionError> {
        match node {
            CompletionNode::Strategy { kind, .. } => self.strategies.run(*kind, words, request),
            CompletionNode::Terminal => Ok(Vec::new()),
            CompletionNode::Namespace(namespace) => {
                self.descend_namespace(namespace, words, partial, request)
            }
        }
    }

    fn descend_namespace(
        &self,
        namespace: &Namespace,
        words: &[&str],
        partial: bool,
        request: &CompletionRequest<'_>,
    ) -> Result<Vec<String>, CompletionError> {
        let Some((key, rest)) = words.split_first() else {
            return Ok(namespace.keys().map(str::to_owned).collect());
        };
        let typing_key = partial && rest.is_empty();
        if !typing_key {
            if let Some(child) = namespace.get(key) {
                return self.descend(child, rest, partial, request);
            }
        }
        Ok(namespace
            .keys()
            .filter(|name| name.starts_with(key))
            .map(|name| format!("{name} "))
            .collect())
    }
}

fn render_chain(err: &dyn StdError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
