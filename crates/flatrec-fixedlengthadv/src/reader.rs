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

//! Streaming legacy fixed-length reader.
//!
//! One input line is one record; the line's first three runes are the
//! record name used for declaration dispatch. [`AdvSource`] keeps at most
//! one pending line; [`Reader`] owns the engine and rewraps its errors with
//! input name and line context.

use crate::decl::{FileDecl, Record};
use crate::error::{FixedLengthAdvError, Result};
use crate::validate;
use flatrec_core::{
    HierarchyReader, MatchOutcome, ReadError, RecordSource, TargetPredicate,
};
use flatrec_idr::{NodeId, NodeKind, Tree};
use std::fmt;
use std::io::{self, BufRead};

/// Number of leading runes of a line forming the record name.
const REC_NAME_RUNES: usize = 3;

struct RawRec {
    /// First three runes of the line.
    name: String,
    /// The whole line.
    raw: String,
    line_num: usize,
}

/// Record source over name-dispatched fixed-length lines.
pub struct AdvSource<R: io::Read> {
    input_name: String,
    r: io::BufReader<R>,
    lines_read: usize,
    pending: Option<RawRec>,
}

impl<R: io::Read> AdvSource<R> {
    /// 1-based line number of the pending record, or of the line right
    /// after the last consumed one. Used for error context.
    pub fn line(&self) -> usize {
        match &self.pending {
            Some(rec) => rec.line_num,
            None => self.lines_read + 1,
        }
    }

    /// Record name of the pending record, if any.
    pub fn pending_name(&self) -> Option<&str> {
        self.pending.as_ref().map(|rec| rec.name.as_str())
    }

    /// Buffer the next non-blank line if none is pending. `Ok(false)` is
    /// end of input.
    fn fill(&mut self) -> std::result::Result<bool, ReadError> {
        if self.pending.is_some() {
            return Ok(true);
        }
        loop {
            let mut raw = String::new();
            let n = self
                .r
                .read_line(&mut raw)
                .map_err(|err| ReadError::Source(err.to_string()))?;
            if n == 0 {
                return Ok(false);
            }
            while raw.ends_with('\n') || raw.ends_with('\r') {
                raw.pop();
            }
            self.lines_read += 1;
            if raw.is_empty() {
                continue;
            }
            self.pending = Some(RawRec {
                name: raw.chars().take(REC_NAME_RUNES).collect(),
                raw,
                line_num: self.lines_read,
            });
            return Ok(true);
        }
    }
}

impl<R: io::Read> RecordSource for AdvSource<R> {
    type Decl = Record;

    fn has_more(&mut self) -> std::result::Result<bool, ReadError> {
        self.fill()
    }

    fn read_and_match(
        &mut self,
        decl: &Record,
        create_node: bool,
        tree: &mut Tree,
    ) -> std::result::Result<MatchOutcome, ReadError> {
        if !self.fill()? {
            return Ok(MatchOutcome::NoMatch);
        }
        let rec = self.pending.as_ref().expect("pending record after fill");
        if rec.name != decl.name {
            return Ok(MatchOutcome::NoMatch);
        }
        if !create_node {
            return Ok(MatchOutcome::Matched);
        }
        let rec = self.pending.take().expect("pending record after fill");
        let node = tree.create_node(NodeKind::Element, &decl.name);
        for field in &decl.fields {
            let field_node = tree.create_node(NodeKind::Element, &field.name);
            tree.add_child(node, field_node);
            let value = tree.create_node(NodeKind::Text, field.extract(&rec.raw));
            tree.add_child(field_node, value);
        }
        Ok(MatchOutcome::Materialized(node))
    }
}

/// Streaming legacy fixed-length format reader.
pub struct Reader<R: io::Read> {
    hr: HierarchyReader<AdvSource<R>>,
}

impl<R: io::Read> fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").finish_non_exhaustive()
    }
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
        let source = AdvSource {
            input_name: input_name.into(),
            r: io::BufReader::new(input),
            lines_read: 0,
            pending: None,
        };
        Ok(Self {
            hr: HierarchyReader::new(root, source, predicate),
        })
    }

    /// Read the next target subtree; `Ok(None)` is end of input.
    pub fn read(&mut self) -> Result<Option<NodeId>> {
        match self.hr.read() {
            Ok(node) => Ok(node),
            Err(ReadError::FewerThanMinOccurs { fqdn, min, actual }) => {
                Err(FixedLengthAdvError::Invalid(self.fmt_err_str(format_args!(
                    "record '{fqdn}' needs min occur {min}, but only got {actual}"
                ))))
            }
            Err(ReadError::UnexpectedData) => {
                let name = self
                    .hr
                    .source()
                    .pending_name()
                    .unwrap_or_default()
                    .to_string();
                Err(FixedLengthAdvError::Invalid(self.fmt_err_str(format_args!(
                    "record '{name}' is either not declared in schema or appears in an \
                     invalid order"
                ))))
            }
            Err(ReadError::Source(msg)) => Err(FixedLengthAdvError::Invalid(
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
    pub fn is_continuable_error(&self, err: &FixedLengthAdvError) -> bool {
        err.is_continuable()
    }

    /// Build a continuable per-record error carrying input name and the
    /// current line number.
    pub fn format_error(&self, args: fmt::Arguments<'_>) -> FixedLengthAdvError {
        FixedLengthAdvError::Record(self.fmt_err_str(args))
    }

    fn fmt_err_str(&self, args: fmt::Arguments<'_>) -> String {
        let source = self.hr.source();
        format!("input '{}' line {}: {}", source.input_name, source.line(), args)
    }
}
