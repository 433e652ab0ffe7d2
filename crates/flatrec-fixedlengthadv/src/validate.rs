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

//! Pre-parse validation and compilation of legacy fixed-length schema
//! declarations.

use crate::decl::{Field, FieldDecl, FileDecl, Record, RecordDecl, TYPE_GROUP, TYPE_RECORD};
use crate::error::FixedLengthAdvError;
use flatrec_core::{build_fqdn, ROOT_NAME, UNBOUNDED};
use std::sync::Arc;

struct ValidateCtx {
    seen_target: bool,
}

/// Validate `decl` and compile it into the engine's declaration tree.
///
/// With a single root-level record an absent `is_target` designates that
/// record; with two or more roots an explicit target is required.
pub(crate) fn compile_file_decl(decl: &FileDecl) -> Result<Arc<Record>, FixedLengthAdvError> {
    let mut ctx = ValidateCtx { seen_target: false };
    let mut roots = Vec::with_capacity(decl.record_declarations.len());
    for record in &decl.record_declarations {
        roots.push(ctx.compile_record("", record)?);
    }
    if !ctx.seen_target {
        if roots.len() > 1 {
            return Err(FixedLengthAdvError::Schema(
                "missing record/record_group with 'is_target' = true".to_string(),
            ));
        }
        if let Some(first) = roots.first_mut() {
            first.target = true;
        }
    }
    Ok(Arc::new(Record {
        name: ROOT_NAME.to_string(),
        fqdn: ROOT_NAME.to_string(),
        target: false,
        group: true,
        min: 1,
        max: 1,
        fields: Vec::new(),
        children: roots.into_iter().map(Arc::new).collect(),
    }))
}

impl ValidateCtx {
    fn compile_record(
        &mut self,
        parent_fqdn: &str,
        decl: &RecordDecl,
    ) -> Result<Record, FixedLengthAdvError> {
        if decl.name.is_empty() {
            return Err(FixedLengthAdvError::Schema(format!(
                "record/record_group under '{}' must have a non-empty 'name'",
                if parent_fqdn.is_empty() { ROOT_NAME } else { parent_fqdn }
            )));
        }
        let fqdn = build_fqdn(parent_fqdn, &decl.name);
        let group = match decl.type_name.as_deref() {
            None | Some(TYPE_RECORD) => false,
            Some(TYPE_GROUP) => true,
            Some(other) => {
                return Err(FixedLengthAdvError::Schema(format!(
                    "record/record_group '{fqdn}' has invalid 'type' '{other}'"
                )));
            }
        };
        if group {
            if decl.child_records.is_empty() {
                return Err(FixedLengthAdvError::Schema(format!(
                    "record_group '{fqdn}' must have at least one child record/record_group"
                )));
            }
            if !decl.fields.is_empty() {
                return Err(FixedLengthAdvError::Schema(format!(
                    "record_group '{fqdn}' must not have any fields"
                )));
            }
        }
        if decl.is_target {
            if self.seen_target {
                return Err(FixedLengthAdvError::Schema(format!(
                    "a second record/record_group ('{fqdn}') with 'is_target' = true \
                     is not allowed"
                )));
            }
            self.seen_target = true;
        }
        let (min, max) = occurs_bounds(&fqdn, decl.min, decl.max)?;
        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            fields.push(compile_field(&fqdn, field)?);
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
            fields,
            children,
        })
    }
}

/// min and max both default to 1; a negative max means unbounded.
fn occurs_bounds(
    fqdn: &str,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<(usize, usize), FixedLengthAdvError> {
    let min = match min {
        None => 1,
        Some(m) if m < 0 => {
            return Err(FixedLengthAdvError::Schema(format!(
                "record/record_group '{fqdn}' has negative 'min' value {m}"
            )));
        }
        Some(m) => m as usize,
    };
    let max = match max {
        None => 1,
        Some(m) if m < 0 => UNBOUNDED,
        Some(m) => m as usize,
    };
    if min > max {
        return Err(FixedLengthAdvError::Schema(format!(
            "record/record_group '{fqdn}' has 'min' value {min} > 'max' value {max}"
        )));
    }
    Ok((min, max))
}

fn compile_field(fqdn: &str, decl: &FieldDecl) -> Result<Field, FixedLengthAdvError> {
    if decl.name.is_empty() {
        return Err(FixedLengthAdvError::Schema(format!(
            "record '{fqdn}' has a field with an empty 'name'"
        )));
    }
    if decl.start_pos < 1 {
        return Err(FixedLengthAdvError::Schema(format!(
            "record '{fqdn}' field '{}' must have 'start_pos' >= 1",
            decl.name
        )));
    }
    Ok(Field {
        name: decl.name.clone(),
        start_pos: decl.start_pos,
        length: decl.length,
        default: decl.default.clone(),
    })
}
