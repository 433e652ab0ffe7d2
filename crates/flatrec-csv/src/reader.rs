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

//! Streaming CSV reader.
//!
//! Wires the engine to a line-numbered CSV tokenizer: [`CsvSource`] keeps at
//! most one pending row and matches it against compiled record declarations
//! by per-column regex; [`Reader`] is the public facade that owns the engine
//! and rewraps its errors with input name and line context.

use crate::decl::{FileDecl, Record};
use crate::error::{CsvError, Result};
use crate::validate;
use flatrec_core::{
    HierarchyReader, MatchOutcome, ReadError, RecordSource, TargetPredicate,
};
use flatrec_idr::{NodeId, NodeKind, Tree};
use std::fmt;
use std::io;

/// Replaces every `"` byte with `'` before CSV tokenization, when enabled.
///
/// Some producers emit unbalanced double quotes that break RFC-4180 quoting;
/// the substitution is blind, so legitimate single quotes in the data are
/// not re-escaped.
struct QuoteReplacingReader<R> {
    inner: R,
    enabled: bool,
}

impl<R: io::Read> io::Read for QuoteReplacingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if self.enabled {
            for b in &mut buf[..n] {
                if *b == b'"' {
                    *b = b'\'';
                }
            }
        }
        Ok(n)
    }
}

/// Record source over delimited rows.
pub struct CsvSource<R: io::Read> {
    input_name: String,
    rdr: csv::Reader<QuoteReplacingReader<R>>,
    pending: Option<csv::StringRecord>,
    pending_line: u64,
}

impl<R: io::Read> CsvSource<R> {
    /// 1-based line number of the pending row, or of the position right
    /// after the last consumed one. Used for error context.
    pub fn line(&self) -> usize {
        if self.pending.is_some() {
            self.pending_line as usize
        } else {
            self.rdr.position().line() as usize
        }
    }

    /// Buffer the next row if none is pending. `Ok(false)` means clean end
    /// of input.
    fn fill(&mut self) -> std::result::Result<bool, ReadError> {
        if self.pending.is_some() {
            return Ok(true);
        }
        let line = self.rdr.position().line();
        let mut record = csv::StringRecord::new();
        match self.rdr.read_record(&mut record) {
            Ok(true) => {
                self.pending_line = line;
                self.pending = Some(record);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => Err(ReadError::Source(err.to_string())),
        }
    }
}

impl<R: io::Read> RecordSource for CsvSource<R> {
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
        let row = self.pending.as_ref().expect("pending row after fill");
        for (idx, col) in decl.columns.iter().enumerate() {
            match row.get(idx) {
                // A cell is present: it must satisfy the column's regex.
                Some(cell) => {
                    if !col.matches(cell) {
                        return Ok(MatchOutcome::NoMatch);
                    }
                }
                // Column beyond the row's length: a match, unless the
                // column demands a regex match.
                None => {
                    if col.matcher.is_some() {
                        return Ok(MatchOutcome::NoMatch);
                    }
                }
            }
        }
        if !create_node {
            return Ok(MatchOutcome::Matched);
        }
        let row = self.pending.take().expect("pending row after fill");
        let node = tree.create_node(NodeKind::Element, &decl.name);
        for (idx, col) in decl.columns.iter().enumerate() {
            let Some(cell) = row.get(idx) else {
                break;
            };
            let col_node = tree.create_node(NodeKind::Element, col.name());
            tree.add_child(node, col_node);
            let value = tree.create_node(NodeKind::Text, cell);
            tree.add_child(col_node, value);
        }
        Ok(MatchOutcome::Materialized(node))
    }
}

/// Streaming CSV format reader.
///
/// # Examples
///
/// ```
/// use flatrec_csv::{FileDecl, Reader};
///
/// let decl: FileDecl = serde_json::from_str(
///     r#"{
///         "delimiter": ",",
///         "records": [
///             { "name": "row", "columns": [{ "name": "date" }, { "name": "tempF" }] }
///         ]
///     }"#,
/// )
/// .unwrap();
/// let input = "2020-01-01,32\n2020-01-02,35\n";
/// let mut reader = Reader::new("weather.csv", input.as_bytes(), &decl, None).unwrap();
/// while let Some(row) = reader.read().unwrap() {
///     println!("{}", reader.tree().subtree_to_string(row));
///     reader.release(row);
/// }
/// ```
pub struct Reader<R: io::Read> {
    hr: HierarchyReader<CsvSource<R>>,
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
        let delimiter = validate::delimiter_byte(decl)?;
        let rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(QuoteReplacingReader {
                inner: input,
                enabled: decl.replace_double_quotes,
            });
        let source = CsvSource {
            input_name: input_name.into(),
            rdr,
            pending: None,
            pending_line: 0,
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
                Err(CsvError::Invalid(self.fmt_err_str(format_args!(
                    "record/record_group '{fqdn}' needs min occur {min}, but only got {actual}"
                ))))
            }
            Err(ReadError::UnexpectedData) => Err(CsvError::Invalid(
                self.fmt_err_str(format_args!("unexpected data")),
            )),
            Err(ReadError::Source(msg)) => {
                Err(CsvError::Invalid(self.fmt_err_str(format_args!("{msg}"))))
            }
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

    /// Whether parsing may continue after `err`. [`CsvError::Invalid`] and
    /// [`CsvError::Schema`] are fatal.
    pub fn is_continuable_error(&self, err: &CsvError) -> bool {
        err.is_continuable()
    }

    /// Build a continuable per-record error carrying input name and the
    /// current line number.
    pub fn format_error(&self, args: fmt::Arguments<'_>) -> CsvError {
        CsvError::Record(self.fmt_err_str(args))
    }

    fn fmt_err_str(&self, args: fmt::Arguments<'_>) -> String {
        let source = self.hr.source();
        format!("input '{}' line {}: {}", source.input_name, source.line(), args)
    }
}
