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

//! Fixed-width schema declarations.
//!
//! An envelope is a window of input lines: either a fixed number of rows
//! (`rows`, default 1) or a span delimited by `header`/`footer` regex
//! matches. [`FileDecl`] is the serde-facing shape of the schema's
//! `file_declaration` fragment; the validator compiles it into the
//! [`Envelope`] tree the engine walks.

use flatrec_core::RecDecl;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

pub(crate) const TYPE_ENVELOPE: &str = "envelope";
pub(crate) const TYPE_GROUP: &str = "envelope_group";

/// A column of an envelope. `start_pos` and `length` are rune-indexed.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDecl {
    pub name: String,
    /// 1-based rune position of the column's first rune.
    pub start_pos: usize,
    /// Rune length of the column.
    pub length: usize,
    /// Regex selecting which line of a multi-row envelope feeds this
    /// column. The first matching line wins; each column is populated at
    /// most once.
    #[serde(default)]
    pub line_pattern: Option<String>,
}

/// An envelope or envelope-group declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeDecl {
    pub name: String,
    /// Fixed row count of the envelope window. Mutually exclusive with
    /// `header`.
    #[serde(default)]
    pub rows: Option<usize>,
    /// Regex the first line of the envelope must match.
    #[serde(default)]
    pub header: Option<String>,
    /// Regex terminating the envelope; defaults to the header line itself
    /// terminating it (single-line envelope).
    #[serde(default)]
    pub footer: Option<String>,
    /// `"envelope"` (default) or `"envelope_group"`.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub is_target: bool,
    /// Minimum occurrences; defaults to 0.
    #[serde(default)]
    pub min: Option<i64>,
    /// Maximum occurrences; absent or negative means unbounded.
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub columns: Vec<ColumnDecl>,
    #[serde(default)]
    pub child_envelopes: Vec<EnvelopeDecl>,
}

/// Fixed-width specific schema settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDecl {
    #[serde(default)]
    pub envelopes: Vec<EnvelopeDecl>,
}

/// A compiled envelope column.
#[derive(Debug, Clone)]
pub(crate) struct Column {
    pub(crate) name: String,
    pub(crate) start_pos: usize,
    pub(crate) length: usize,
    pub(crate) line_pattern: Option<Regex>,
}

impl Column {
    /// Whether this column draws its value from `line`.
    pub(crate) fn line_match(&self, line: &str) -> bool {
        match &self.line_pattern {
            Some(re) => re.is_match(line),
            None => true,
        }
    }

    /// Rune-indexed slice `[start_pos, start_pos + length)` of `line`,
    /// silently truncated if the line is shorter.
    pub(crate) fn line_to_column_value(&self, line: &str) -> String {
        line.chars()
            .skip(self.start_pos - 1)
            .take(self.length)
            .collect()
    }
}

/// A compiled envelope declaration, as consumed by the engine.
#[derive(Debug)]
pub struct Envelope {
    pub(crate) name: String,
    pub(crate) fqdn: String,
    pub(crate) target: bool,
    pub(crate) group: bool,
    pub(crate) min: usize,
    pub(crate) max: usize,
    pub(crate) rows: Option<usize>,
    pub(crate) header: Option<Regex>,
    pub(crate) footer: Option<Regex>,
    pub(crate) columns: Vec<Column>,
    pub(crate) children: Vec<Arc<Envelope>>,
}

impl Envelope {
    /// Whether the envelope window is a fixed row count (no `header`).
    pub(crate) fn rows_based(&self) -> bool {
        self.header.is_none()
    }

    /// The fixed window size; defaults to 1.
    pub(crate) fn rows(&self) -> usize {
        self.rows.unwrap_or(1)
    }

    pub(crate) fn match_header(&self, line: &str) -> bool {
        self.header
            .as_ref()
            .expect("envelope is not header/footer based")
            .is_match(line)
    }

    /// Without an explicit footer any line terminates the envelope, so the
    /// header line alone forms it.
    pub(crate) fn match_footer(&self, line: &str) -> bool {
        match &self.footer {
            Some(re) => re.is_match(line),
            None => true,
        }
    }
}

impl RecDecl for Envelope {
    fn name(&self) -> &str {
        &self.name
    }

    fn fqdn(&self) -> &str {
        &self.fqdn
    }

    fn is_target(&self) -> bool {
        self.target
    }

    fn is_group(&self) -> bool {
        self.group
    }

    fn min_occurs(&self) -> usize {
        self.min
    }

    fn max_occurs(&self) -> usize {
        self.max
    }

    fn children(&self) -> &[Arc<Envelope>] {
        &self.children
    }
}
