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

//! Legacy fixed-length schema declarations.
//!
//! In this format every input line is one record, dispatched by the line's
//! first three runes matching the declaration name (an external file-format
//! convention, e.g. `HDR`, `NWR`, `TRL`). Fields are rune-indexed slices of
//! the line.

use flatrec_core::RecDecl;
use serde::Deserialize;
use std::sync::Arc;

pub(crate) const TYPE_RECORD: &str = "record";
pub(crate) const TYPE_GROUP: &str = "record_group";

/// A field inside a record. `start_pos` and `length` are rune-indexed.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    /// 1-based rune position of the field's first rune.
    pub start_pos: usize,
    /// Rune length of the field.
    pub length: usize,
    /// Value used when the field's window lies entirely beyond the line.
    #[serde(default)]
    pub default: Option<String>,
}

/// A record or record-group declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    /// `"record"` (default) or `"record_group"`.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub is_target: bool,
    /// Minimum occurrences; defaults to 1.
    #[serde(default)]
    pub min: Option<i64>,
    /// Maximum occurrences; defaults to 1, negative means unbounded.
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub child_records: Vec<RecordDecl>,
}

/// Legacy fixed-length specific schema settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDecl {
    #[serde(default)]
    pub record_declarations: Vec<RecordDecl>,
}

/// A compiled field.
#[derive(Debug, Clone)]
pub(crate) struct Field {
    pub(crate) name: String,
    pub(crate) start_pos: usize,
    pub(crate) length: usize,
    pub(crate) default: Option<String>,
}

impl Field {
    /// Rune-indexed slice `[start_pos, start_pos + length)` of `line`,
    /// silently truncated if the line is shorter; the declared default if
    /// the slice is empty.
    pub(crate) fn extract(&self, line: &str) -> String {
        let value: String = line
            .chars()
            .skip(self.start_pos - 1)
            .take(self.length)
            .collect();
        if value.is_empty() {
            if let Some(default) = &self.default {
                return default.clone();
            }
        }
        value
    }
}

/// A compiled record declaration, as consumed by the engine.
#[derive(Debug)]
pub struct Record {
    pub(crate) name: String,
    pub(crate) fqdn: String,
    pub(crate) target: bool,
    pub(crate) group: bool,
    pub(crate) min: usize,
    pub(crate) max: usize,
    pub(crate) fields: Vec<Field>,
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
