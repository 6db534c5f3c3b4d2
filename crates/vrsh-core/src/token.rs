// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Tokenizer shared by the completion engine and the command loop.
// Author: Lukas Bower

//! Tokenizer shared by the completion engine and the command loop.

use crate::tree::{CompletionNode, CompletionTree};

/// Characters that end the word being completed.
pub const WORD_DELIMITERS: &str = " \t\n`~!@#$%^&*()-=+[{]}\\|;:'\",<>/?";

/// Split text into whitespace-delimited words.
#[must_use]
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Return the byte offset where the word ending at `end` begins.
#[must_use]
pub fn word_start(line: &str, end: usize) -> usize {
    let end = end.min(line.len());
    let Some(head) = line.get(..end) else {
        return end;
    };
    head.char_indices()
        .rev()
        .find(|(_, ch)| WORD_DELIMITERS.contains(*ch))
        .map_or(0, |(idx, ch)| idx + ch.len_utf8())
}

/// Tokenized input awaiting completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputLine<'a> {
    words: Vec<&'a str>,
    partial: bool,
}

impl<'a> InputLine<'a> {
    /// Tokenize `text`; the last word is partial unless whitespace follows it.
    #[must_use]
    pub fn parse(text: &'a str) -> Self {
        let words = tokenize(text);
        let partial = !words.is_empty() && !text.ends_with(char::is_whitespace);
        Self { words, partial }
    }

    /// Return every word, the partial one included.
    #[must_use]
    pub fn words(&self) -> &[&'a str] {
        &self.words
    }

    /// Return true when the last word is still being typed.
    #[must_use]
    pub fn has_partial(&self) -> bool {
        self.partial
    }

    /// Return the word being typed, if any.
    #[must_use]
    pub fn partial(&self) -> Option<&'a str> {
        if self.partial {
            self.words.last().copied()
        } else {
            None
        }
    }
}

/// How a submitted line resolved against the completion tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The path names a command.
    Command,
    /// The path stops at a command group.
    Namespace,
    /// The first word names nothing in the tree.
    Unknown,
}

/// Submitted line split into a command path and its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    path: Vec<String>,
    args: Vec<String>,
    resolution: Resolution,
}

impl CommandLine {
    /// Parse `line` using the tree to decide where the command path ends.
    ///
    /// Returns `None` for blank lines.
    #[must_use]
    pub fn parse(line: &str, tree: &CompletionTree) -> Option<Self> {
        let words = tokenize(line);
        if words.is_empty() {
            return None;
        }
        let mut path = Vec::new();
        let mut namespace = Some(tree.root());
        let mut resolution = Resolution::Unknown;
        let mut consumed = 0;
        for word in &words {
            let Some(node) = namespace.and_then(|ns| ns.get(word)) else {
                break;
            };
            path.push((*word).to_owned());
            consumed += 1;
            match node {
                CompletionNode::Namespace(child) => {
                    namespace = Some(child);
                    resolution = Resolution::Namespace;
                }
                CompletionNode::Terminal | CompletionNode::Strategy { .. } => {
                    resolution = Resolution::Command;
                    break;
                }
            }
        }
        let args = words[consumed..].iter().map(|w| (*w).to_owned()).collect();
        Some(Self {
            path,
            args,
            resolution,
        })
    }

    /// Return the namespace and command names.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Return the arguments following the command path.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Return how the path resolved.
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Return the first word of the line.
    #[must_use]
    pub fn head(&self) -> &str {
        self.path
            .first()
            .or_else(|| self.args.first())
            .map_or("", String::as_str)
    }

    /// Render the request line sent to the controller.
    #[must_use]
    pub fn render(&self) -> String {
        let mut words = self.path.iter().chain(self.args.iter());
        let mut rendered = String::new();
        if let Some(first) = words.next() {
            rendered.push_str(first);
        }
        for word in words {
            rendered.push(' ');
            rendered.push_str(word);
        }
        rendered
    }
}
