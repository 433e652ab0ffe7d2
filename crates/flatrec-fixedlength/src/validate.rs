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

//! Pre-parse validation and compilation of fixed-width schema declarations.

use crate::decl::{Column, ColumnDecl, Envelope, EnvelopeDecl, FileDecl, TYPE_ENVELOPE, TYPE_GROUP};
use crate::error::FixedLengthError;
use flatrec_core::{build_fqdn, caches, ROOT_NAME, UNBOUNDED};
use regex::Regex;
use std::sync::Arc;

struct ValidateCtx {
    seen_target: bool,
}

/// Validate `decl` and compile it into the engine's declaration tree.
///
/// If no envelope carries `is_target`, the first root-level envelope is
/// designated as the target.
pub(crate) fn compile_file_decl(decl: &FileDecl) -> Result<Arc<Envelope>, FixedLengthError> {
    let mut ctx = ValidateCtx { seen_target: false };
    let mut roots = Vec::with_capacity(decl.envelopes.len());
    for envelope in &decl.envelopes {
        roots.push(ctx.compile_envelope("", envelope)?);
    }
    if !ctx.seen_target && !roots.is_empty() {
        roots[0].target = true;
    }
    Ok(Arc::new(Envelope {
        name: ROOT_NAME.to_string(),
        fqdn: ROOT_NAME.to_string(),
        target: false,
        group: true,
        min: 1,
        max: 1,
        rows: None,
        header: None,
        footer: None,
        columns: Vec::new(),
        children: roots.into_iter().map(Arc::new).collect(),
    }))
}

impl ValidateCtx {
    fn compile_envelope(
        &mut self,
        parent_fqdn: &str,
        decl: &EnvelopeDecl,
    ) -> Result<Envelope, FixedLengthError> {
        if decl.name.is_empty() {
            return Err(FixedLengthError::Schema(format!(
                "envelope/envelope_group under '{}' must have a non-empty 'name'",
                if parent_fqdn.is_empty() { ROOT_NAME } else { parent_fqdn }
            )));
        }
        let fqdn = build_fqdn(parent_fqdn, &decl.name);
        let group = match decl.type_name.as_deref() {
            None | Some(TYPE_ENVELOPE) => false,
            Some(TYPE_GROUP) => true,
            Some(other) => {
                return Err(FixedLengthError::Schema(format!(
                    "envelope/envelope_group '{fqdn}' has invalid 'type' '{other}'"
                )));
            }
        };
        if group {
            if decl.child_envelopes.is_empty() {
                return Err(FixedLengthError::Schema(format!(
                    "envelope_group '{fqdn}' must have at least one child envelope/envelope_group"
                )));
            }
            if !decl.columns.is_empty() {
                return Err(FixedLengthError::Schema(format!(
                    "envelope_group '{fqdn}' must not have any columns"
                )));
            }
            if decl.rows.is_some() || decl.header.is_some() || decl.footer.is_some() {
                return Err(FixedLengthError::Schema(format!(
                    "envelope_group '{fqdn}' must not specify 'rows', 'header' or 'footer'"
                )));
            }
        }
        if decl.rows.is_some() && decl.header.is_some() {
            return Err(FixedLengthError::Schema(format!(
                "envelope '{fqdn}' cannot specify both 'rows' and 'header'"
            )));
        }
        if decl.footer.is_some() && decl.header.is_none() {
            return Err(FixedLengthError::Schema(format!(
                "envelope '{fqdn}' cannot specify 'footer' without 'header'"
            )));
        }
        if decl.rows == Some(0) {
            return Err(FixedLengthError::Schema(format!(
                "envelope '{fqdn}' must have 'rows' >= 1"
            )));
        }
        if decl.is_target {
            if self.seen_target {
                return Err(FixedLengthError::Schema(format!(
                    "a second envelope/envelope_group ('{fqdn}') with 'is_target' = true \
                     is not allowed"
                )));
            }
            self.seen_target = true;
        }
        let (min, max) = occurs_bounds(&fqdn, decl.min, decl.max)?;
        let header = compile_pattern(&fqdn, "header", decl.header.as_deref())?;
        let footer = compile_pattern(&fqdn, "footer", decl.footer.as_deref())?;
        let mut columns = Vec::with_capacity(decl.columns.len());
        for col in &decl.columns {
            columns.push(compile_column(&fqdn, col)?);
        }
        let mut children = Vec::with_capacity(decl.child_envelopes.len());
        for child in &decl.child_envelopes {
            children.push(Arc::new(self.compile_envelope(&fqdn, child)?));
        }
        Ok(Envelope {
            name: decl.name.clone(),
            fqdn,
            target: decl.is_target,
            group,
            min,
            max,
            rows: decl.rows,
            header,
            footer,
            columns,
            children,
        })
    }
}

/// min defaults to 0; max defaults to unbounded, as does any negative max.
fn occurs_bounds(
    fqdn: &str,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<(usize, usize), FixedLengthError> {
    let min = match min {
        None => 0,
        Some(m) if m < 0 => {
            return Err(FixedLengthError::Schema(format!(
                "envelope/envelope_group '{fqdn}' has negative 'min' value {m}"
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
        return Err(FixedLengthError::Schema(format!(
            "envelope/envelope_group '{fqdn}' has 'min' value {min} > 'max' value {max}"
        )));
    }
    Ok((min, max))
}

fn compile_pattern(
    fqdn: &str,
    what: &str,
    pattern: Option<&str>,
) -> Result<Option<Regex>, FixedLengthError> {
    match pattern {
        None => Ok(None),
        Some(pattern) => caches::get_regex(pattern).map(Some).map_err(|err| {
            FixedLengthError::Schema(format!(
                "envelope '{fqdn}' has an invalid '{what}' regexp '{pattern}': {err}"
            ))
        }),
    }
}

fn compile_column(fqdn: &str, decl: &ColumnDecl) -> Result<Column, FixedLengthError> {
    if decl.name.is_empty() {
        return Err(FixedLengthError::Schema(format!(
            "envelope '{fqdn}' has a column with an empty 'name'"
        )));
    }
    if decl.start_pos < 1 {
        return Err(FixedLengthError::Schema(format!(
            "envelope '{fqdn}' column '{}' must have 'start_pos' >= 1",
            decl.name
        )));
    }
    let line_pattern = match &decl.line_pattern {
        None => None,
        Some(pattern) => Some(caches::get_regex(pattern).map_err(|err| {
            FixedLengthError::Schema(format!(
                "envelope '{fqdn}' column '{}' has an invalid 'line_pattern' regexp \
                 '{pattern}': {err}",
                decl.name
            ))
        })?),
    };
    Ok(Column {
        name: decl.name.clone(),
        start_pos: decl.start_pos,
        length: decl.length,
        line_pattern,
    })
}
