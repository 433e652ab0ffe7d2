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

//! Engine-level errors.
//!
//! These are payload-first: the format readers catch them and rebuild their
//! own error with input name and line context, so the `Display` strings here
//! only serve debugging.

use thiserror::Error;

/// An error surfaced by [`HierarchyReader::read`](crate::HierarchyReader::read).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// A declaration completed fewer instances than its `min` bound before
    /// the input (or a non-matching record) forced it to advance.
    #[error("'{fqdn}' needs min occur {min}, but only got {actual}")]
    FewerThanMinOccurs {
        /// fqdn of the underflowing declaration.
        fqdn: String,
        /// The declaration's `min` bound.
        min: usize,
        /// Instances actually completed.
        actual: usize,
    },

    /// The input still has unprocessed records but every top-level
    /// declaration has reached its `max` bound.
    #[error("unexpected data")]
    UnexpectedData,

    /// A fatal IO or format error raised by the record source. The message
    /// is the source's own; positional context is added by the format
    /// reader that owns the source.
    #[error("{0}")]
    Source(String),
}
