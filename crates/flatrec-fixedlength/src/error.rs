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

//! Error types for the fixed-width front-end.

use thiserror::Error;

/// Fixed-width parsing error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixedLengthError {
    /// The schema's envelope declarations are invalid. Only returned by
    /// [`Reader::new`](crate::Reader::new), never by `read`.
    #[error("invalid fixed-length schema: {0}")]
    Schema(String),

    /// The fixed-width content is corrupted, an IO failure occurred, or the
    /// input does not satisfy the schema's occurrence bounds. Fatal and
    /// non-continuable; the message carries input name and line number.
    #[error("{0}")]
    Invalid(String),

    /// A per-record error raised through
    /// [`Reader::format_error`](crate::Reader::format_error) on behalf of
    /// the layer above. Continuable.
    #[error("{0}")]
    Record(String),
}

impl FixedLengthError {
    /// Whether parsing may continue after this error.
    pub fn is_continuable(&self) -> bool {
        matches!(self, FixedLengthError::Record(_))
    }
}

/// Convenience alias for `Result` with [`FixedLengthError`].
pub type Result<T> = std::result::Result<T, FixedLengthError>;
