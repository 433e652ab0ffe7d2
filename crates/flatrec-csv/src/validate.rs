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

//! Pre-parse validation and compilation of CSV schema declarations.

use crate::decl::{Column, ColumnDecl, FileDecl, Record, RecordDecl, TYPE_GROUP, TYPE_RECORD};
use crate::error::CsvError;
use flatrec_core::{build_fqdn, caches, ROOT_NAME, UNBOUNDED};
use std::sync::Arc;

struct ValidateCtx {
    seen_target: bool,
}

/// Validate `decl` and compile it into the engine's declaration tree.
///
/// If no record carries `is_target`, the first root-level record is
/// designated as the target.
pub(crate) fn compile_file_decl(decl: &FileDecl) -> Result<Arc<Record>, CsvError> {
    let mut ctx = ValidateCtx { seen_target: false };
    let mut roots = Vec::with_capacity(decl.records.len());
    for record in &decl.records {
        roots.push(ctx.compile_record("", record)?);
    }
    if !ctx.seen_target && !roots.is_empty() {
        roots[0].target = true;
    }
    Ok(Arc::new(Record {
        name: ROOT_NAME.to_string(),
        fqdn: ROOT_NAME.to_string(),
        target: false,
        group: true,
        min: 1,
        max: 1,
        columns: Vec::new(),
        children: roots.into_iter().map(Arc::new).collect(),
    }))
}

/// The schema's delimiter as the byte the CSV tokenizer needs.
pub(crate) fn delimiter_byte(decl: &FileDecl) -> Result<u8, CsvError> {
    let mut chars = decl.delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.len_utf8() == 1 => Ok(c as u8),
        (Some(c), None) => Err(CsvError::Schema(format!(
            "'delimiter' '{c}' must be a single-byte character"
        ))),
        _ => Err(CsvError::Schema(format!(
            "'delimiter' '{}' must be a single character",
            decl.delimiter
        ))),
    }
}

impl ValidateCtx {
    fn compile_record(&mut self, parent_fqdn: &str, decl: &RecordDecl) -> Result<Record, CsvError> {
        if decl.name.is_empty() {
            return Err(CsvError::Schema(format!(
                "record/record_group under '{}' must have a non-empty 'name'",
                if parent_fqdn.is_empty() { ROOT_NAME } else { parent_fqdn }
            )));
        }
        let fqdn = build_fqdn(parent_fqdn, &decl.name);
        let group = match decl.type_name.as_deref() {
            None | Some(TYPE_RECORD) => false,
            Some(TYPE_GROUP) => true,
            Some(other) => {
                return Err(CsvError::Schema(format!(
                    "record/record_group '{fqdn}' has invalid 'type' '{other}'"
                )));
            }
        };
        if group {
            if decl.child_records.is_empty() {
                return Err(CsvError::Schema(format!(
                    "record_group '{fqdn}' must have at least one child record/record_group"
                )));
            }
            if !decl.columns.is_empty() {
                return Err(CsvError::Schema(format!(
                    "record_group '{fqdn}' must not have any columns"
                )));
            }
        }
        if decl.is_target {
            if self.seen_target {
                return Err(CsvError::Schema(format!(
                    "a second record/record_group ('{fqdn}') with 'is_target' = true is not allowed"
                )));
            }
            self.seen_target = true;
        }
        let (min, max) = occurs_bounds(&fqdn, decl.min, decl.max)?;
        let mut columns = Vec::with_capacity(decl.columns.len());
        for (idx, col) in decl.columns.iter().enumerate() {
            columns.push(compile_column(&fqdn, col, idx)?);
        }
        let mut children = Vec::with_capacity(decl.child_records.len());
        for child in &decl.child_records {
            children.push(Arc::new(self.compile_record(&fqdn, child)?));
        }
        Ok(Record {
            name: decl.name.clone(),
            fqdn,
            target: decl.is_target,
            group,
            min,
            max,
            columns,
            children,
        })
    }
}

/// min defaults to 0; max defaults to unbounded, as does any negative max.
fn occurs_bounds(fqdn: &str, min: Option<i64>, max: Option<i64>) -> Result<(usize, usize), CsvError> {
    let min = match min {
        None => 0,
        Some(m) if m < 0 => {
            return Err(CsvError::Schema(format!(
                "record/record_group '{fqdn}' has negative 'min' value {m}"
            )));
        }
        Some(m) => m as usize,
    };
    let max = match max {
        None => UNBOUNDED,
        Some(m) if m < 0 => UNBOUNDED,
        Some(m) => m as usize,
    };
    if min > max {
        return Err(CsvError::Schema(format!(
            "record/record_group '{fqdn}' has 'min' value {min} > 'max' value {max}"
        )));
    }
    Ok((min, max))
}

fn compile_column(fqdn: &str, decl: &ColumnDecl, idx: usize) -> Result<Column, CsvError> {
    let matcher = match &decl.match_pattern {
        None => None,
        Some(pattern) => Some(caches::get_regex(pattern).map_err(|err| {
            CsvError::Schema(format!(
                "record '{fqdn}' column[{}/'{}'] has an invalid 'match' regexp '{pattern}': {err}",
                idx + 1,
                decl.name.as_deref().unwrap_or(""),
            ))
        })?),
    };
    Ok(Column {
        name: decl.name.clone(),
        matcher,
    })
}
