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

//! CSV schema declarations.
//!
//! [`FileDecl`] is the serde-facing shape of the schema's
//! `file_declaration` fragment for the `csv2` format. The validator in
//! [`validate`](crate::validate) compiles it into the [`Record`] tree the
//! engine walks.

use flatrec_core::RecDecl;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

pub(crate) const TYPE_RECORD: &str = "record";
pub(crate) const TYPE_GROUP: &str = "record_group";

/// A CSV column declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDecl {
    /// Column name; unnamed columns materialize with an empty element name.
    #[serde(default)]
    pub name: Option<String>,
    /// Regex the cell at this column must match for the record to match.
    #[serde(default, rename = "match")]
    pub match_pattern: Option<String>,
}

/// A CSV record or record-group declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    /// `"record"` (default) or `"record_group"`.
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
    pub child_records: Vec<RecordDecl>,
}

/// CSV specific schema settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDecl {
    /// The field delimiter, a single character.
    pub delimiter: String,
    /// Replace every `"` byte with `'` before CSV tokenization. Note this
    /// is a blind substitution: pre-existing single quotes in the data are
    /// not re-escaped.
    #[serde(default)]
    pub replace_double_quotes: bool,
    #[serde(default)]
    pub records: Vec<RecordDecl>,
}

/// A compiled CSV column.
#[derive(Debug, Clone)]
pub(crate) struct Column {
    pub(crate) name: Option<String>,
    pub(crate) matcher: Option<Regex>,
}

impl Column {
    pub(crate) fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Whether `cell` satisfies this column. A column without a `match`
    /// regex accepts anything.
    pub(crate) fn matches(&self, cell: &str) -> bool {
        match &self.matcher {
            Some(re) => re.is_match(cell),
            None => true,
        }
    }
}

/// A compiled CSV record declaration, as consumed by the engine.
#[derive(Debug)]
pub struct Record {
    pub(crate) name: String,
    pub(crate) fqdn: String,
    pub(crate) target: bool,
    pub(crate) group: bool,
    pub(crate) min: usize,
    pub(crate) max: usize,
    pub(crate) columns: Vec<Column>,
    pub(crate) children: Vec<Arc<Record>>,
}

impl RecDecl for Record {
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

    fn children(&self) -> &[Arc<Record>] {
        &self.children
    }
}
