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

//! Format-specific record source contract.
//!
//! A record source is a forward-only cursor over raw records of one input
//! format. It owns the pending, peeked-but-unconsumed record; the engine
//! never sees raw data, only the outcome of a match attempt.

use crate::decl::RecDecl;
use crate::error::ReadError;
use flatrec_idr::{NodeId, Tree};

/// Outcome of a [`RecordSource::read_and_match`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The pending record does not match the declaration. Nothing was
    /// consumed.
    NoMatch,
    /// The pending record matches, and was left pending because the caller
    /// asked for a probe only (`create_node = false`).
    Matched,
    /// The pending record matches, was materialized into the tree, and was
    /// consumed.
    Materialized(NodeId),
}

/// Cursor over the raw records of one input.
///
/// # Contract
///
/// - [`has_more`](Self::has_more) is a non-destructive availability probe.
///   End of input is `Ok(false)`, never an error, and is sticky: once it
///   returns `Ok(false)` all later calls do too. The probe may buffer one
///   record internally.
/// - [`read_and_match`](Self::read_and_match) peeks the next unprocessed
///   record and matches it against `decl`, which the engine guarantees is
///   not a group. With `create_node = true` a match is materialized into
///   `tree` (an unattached element subtree) and the record consumed; with
///   `create_node = false` a match only reports [`MatchOutcome::Matched`]
///   and leaves the record pending for the engine's later call on the
///   concrete leaf declaration. A non-match never consumes.
/// - Fatal IO or format errors are returned as [`ReadError::Source`] and
///   end the parse.
pub trait RecordSource {
    /// The compiled declaration type this source matches against.
    type Decl: RecDecl;

    /// Whether any unprocessed record remains.
    fn has_more(&mut self) -> Result<bool, ReadError>;

    /// Match the pending record against `decl`, materializing on request.
    fn read_and_match(
        &mut self,
        decl: &Self::Decl,
        create_node: bool,
        tree: &mut Tree,
    ) -> Result<MatchOutcome, ReadError>;
}
