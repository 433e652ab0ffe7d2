// Dweve Flatrec - Streaming Flat-File Record Parser
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Streaming fixed-width reader.
//!
//! [`FixedLengthSource`] buffers a window of non-blank input lines and
//! matches it against envelope declarations: a fixed `rows` count fills the
//! window unconditionally, a `header`/`footer` pair accumulates lines from a
//! header match to the first footer match. [`Reader`] is the public facade
//! that owns the engine and rewraps its errors with input name and the first
//! unprocessed line number.

use crate::decl::{Envelope, FileDecl};
use crate::error::{FixedLengthError, Result};
use crate::validate;
use flatrec_core::{
    HierarchyReader, MatchOutcome, ReadError, RecordSource, TargetPredicate,
};
use flatrec_idr::{NodeId, NodeKind, Tree};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead};

struct Line {
    line_num: usize,
    text: String,
}

/// Record source over windows of fixed-width lines.
pub struct FixedLengthSource<R: io::Read> {
    input_name: String,
    r: io::BufReader<R>,
    /// Total lines read, including blank ones and those still buffered.
    lines_read: usize,
    /// Unprocessed, non-blank lines.
    lines_buf: VecDeque<Line>,
}

impl<R: io::Read> FixedLengthSource<R> {
    /// 1-based line number of the first unprocessed line, for error
    /// context.
    pub fn unprocessed_line_num(&self) -> usize {
        self.lines_buf
            .front()
            .map_or(self.lines_read + 1, |line| line.line_num)
    }

    /// Read the next non-blank line into the buffer. `Ok(false)` is end of
    /// input. Blank lines are skipped but still counted.
    fn read_line(&mut self) -> std::result::Result<bool, ReadError> {
        loop {
            let mut text = String::new();
            let n = self
                .r
                .read_line(&mut text)
                .map_err(|err| ReadError::Source(err.to_string()))?;
            if n == 0 {
                return Ok(false);
            }
            while text.ends_with('\n') || text.ends_with('\r') {
                text.pop();
            }
            self.lines_read += 1;
            if !text.is_empty() {
                self.lines_buf.push_back(Line {
                    line_num: self.lines_read,
                    text,
                });
                return Ok(true);
            }
        }
    }

    fn read_and_match_rows_based(
        &mut self,
        decl: &Envelope,
        create_node: bool,
        tree: &mut Tree,
    ) -> std::result::Result<MatchOutcome, ReadError> {
        while self.lines_buf.len() < decl.rows() {
            if !self.read_line()? {
                // EOF before the window fills: not a match; the engine's
                // min-occurs bookkeeping decides whether that is an error.
                return Ok(MatchOutcome::NoMatch);
            }
        }
        if !create_node {
            return Ok(MatchOutcome::Matched);
        }
        let node = self.window_to_node(decl, decl.rows(), tree);
        self.pop_front(decl.rows());
        Ok(MatchOutcome::Materialized(node))
    }

    fn read_and_match_header_footer_based(
        &mut self,
        decl: &Envelope,
        create_node: bool,
        tree: &mut Tree,
    ) -> std::result::Result<MatchOutcome, ReadError> {
        if self.lines_buf.is_empty() && !self.read_line()? {
            return Ok(MatchOutcome::NoMatch);
        }
        if !decl.match_header(&self.lines_buf[0].text) {
            return Ok(MatchOutcome::NoMatch);
        }
        let mut i = 0;
        loop {
            if decl.match_footer(&self.lines_buf[i].text) {
                if !create_node {
                    return Ok(MatchOutcome::Matched);
                }
                let node = self.window_to_node(decl, i + 1, tree);
                self.pop_front(i + 1);
                return Ok(MatchOutcome::Materialized(node));
            }
            if i + 1 >= self.lines_buf.len() && !self.read_line()? {
                // EOF with an unterminated envelope: no match; the header
                // line stays buffered and surfaces as unexpected data or an
                // underflow.
                return Ok(MatchOutcome::NoMatch);
            }
            i += 1;
        }
    }

    /// Materialize the first `n` buffered lines as an envelope node. Each
    /// column takes its value from the first window line matching its
    /// `line_pattern` (every line, if it has none); a column is populated
    /// at most once, and not at all if no line matches.
    fn window_to_node(&self, decl: &Envelope, n: usize, tree: &mut Tree) -> NodeId {
        let node = tree.create_node(NodeKind::Element, &decl.name);
        for col in &decl.columns {
            for i in 0..n {
                let line = &self.lines_buf[i];
                if !col.line_match(&line.text) {
                    continue;
                }
                let col_node = tree.create_node(NodeKind::Element, &col.name);
                tree.add_child(node, col_node);
                let value =
                    tree.create_node(NodeKind::Text, col.line_to_column_value(&line.text));
                tree.add_child(col_node, value);
                break;
            }
        }
        node
    }

    fn pop_front(&mut self, n: usize) {
        for _ in 0..n {
            self.lines_buf
                .pop_front()
                .expect("fewer buffered lines than requested");
        }
    }
}

impl<R: io::Read> RecordSource for FixedLengthSource<R> {
    type Decl = Envelope;

    fn has_more(&mut self) -> std::result::Result<bool, ReadError> {
        if !self.lines_buf.is_empty() {
            return Ok(true);
        }
        self.read_line()
    }

    fn read_and_match(
        &mut self,
        decl: &Envelope,
        create_node: bool,
        tree: &mut Tree,
    ) -> std::result::Result<MatchOutcome, ReadError> {
        if decl.rows_based() {
            self.read_and_match_rows_based(decl, create_node, tree)
        } else {
            self.read_and_match_header_footer_based(decl, create_node, tree)
        }
    }
}

/// Streaming fixed-width format reader.
///
/// # Examples
///
/// ```
/// use flatrec_fixedlength::{FileDecl, Reader};
///
/// let decl: FileDecl = serde_json::from_str(
///     r#"{
///         "envelopes": [
///             {
///                 "name": "reading",
///                 "columns": [
///                     { "name": "station", "start_pos": 1, "length": 4 },
///                     { "name": "temp", "start_pos": 5, "length": 3 }
///                 ]
///             }
///         ]
///     }"#,
/// )
/// .unwrap();
/// let input = "OSLO-04\nRIGA+02\n";
/// let mut reader = Reader::new("temps.txt", input.as_bytes(), &decl, None).unwrap();
/// while let Some(node) = reader.read().unwrap() {
///     println!("{}", reader.tree().subtree_to_string(node));
///     reader.release(node);
/// }
/// ```
pub struct Reader<R: io::Read> {
    hr: HierarchyReader<FixedLengthSource<R>>,
}

impl<R: io::Read> Reader<R> {
    /// Validate `decl` and build a reader over `input`.
    pub fn new(
        input_name: impl Into<String>,
        input: R,
        decl: &FileDecl,
        predicate: Option<Box<dyn TargetPredicate>>,
    ) -> Result<Self> {
        let root = validate::compile_file_decl(decl)?;
        let source = FixedLengthSource {
            input_name: input_name.into(),
            r: io::BufReader::new(input),
            lines_read: 0,
            lines_buf: VecDeque::new(),
        };
        Ok(Self {
            hr: HierarchyReader::new(root, source, predicate),
        })
    }

    /// Read the next target subtree; `Ok(None)` is end of input.
    ///
    /// The returned subtree is owned by the caller until
    /// [`release`](Self::release); an unreleased subtree is reclaimed by
    /// the next `read` call.
    pub fn read(&mut self) -> Result<Option<NodeId>> {
        match self.hr.read() {
            Ok(node) => Ok(node),
            Err(ReadError::FewerThanMinOccurs { fqdn, min, actual }) => {
                Err(FixedLengthError::Invalid(self.fmt_err_str(format_args!(
                    "envelope/envelope_group '{fqdn}' needs min occur {min}, but only got {actual}"
                ))))
            }
            Err(ReadError::UnexpectedData) => Err(FixedLengthError::Invalid(
                self.fmt_err_str(format_args!("unexpected data")),
            )),
            Err(ReadError::Source(msg)) => Err(FixedLengthError::Invalid(
                self.fmt_err_str(format_args!("{msg}")),
            )),
        }
    }

    /// Release a subtree returned by [`read`](Self::read).
    pub fn release(&mut self, node: NodeId) {
        self.hr.release(node);
    }

    /// The tree arena holding the emitted subtrees.
    pub fn tree(&self) -> &Tree {
        self.hr.tree()
    }

    /// Whether parsing may continue after `err`.
    /// [`FixedLengthError::Invalid`] and [`FixedLengthError::Schema`] are
    /// fatal.
    pub fn is_continuable_error(&self, err: &FixedLengthError) -> bool {
        err.is_continuable()
    }

    /// Build a continuable per-record error carrying input name and the
    /// current line number.
    pub fn format_error(&self, args: fmt::Arguments<'_>) -> FixedLengthError {
        FixedLengthError::Record(self.fmt_err_str(args))
    }

    fn fmt_err_str(&self, args: fmt::Arguments<'_>) -> String {
        let source = self.hr.source();
        format!(
            "input '{}' line {}: {}",
            source.input_name,
            source.unprocessed_line_num(),
            args
        )
    }
}
