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

//! Error types for the CSV front-end.

use thiserror::Error;

/// CSV parsing error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvError {
    /// The schema's CSV declarations are invalid. Only returned by
    /// [`Reader::new`](crate::Reader::new), never by `read`.
    #[error("invalid csv schema: {0}")]
    Schema(String),

    /// The CSV content is corrupted, an IO failure occurred, or the input
    /// does not satisfy the schema's occurrence bounds. Fatal and
    /// non-continuable; the message carries input name and line number.
    #[error("{0}")]
    Invalid(String),

    /// A per-record error raised through
    /// [`Reader::format_error`](crate::Reader::format_error) on behalf of
    /// the layer above. Continuable: parsing proceeds from the next target.
    #[error("{0}")]
    Record(String),
}

impl CsvError {
    /// Whether parsing may continue after this error.
    pub fn is_continuable(&self) -> bool {
        matches!(self, CsvError::Record(_))
    }
}

/// Convenience alias for `Result` with [`CsvError`].
pub type Result<T> = std::result::Result<T, CsvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_display() {
        let err = CsvError::Schema("record 'a' has 'min' value 3 > 'max' value 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid csv schema: record 'a' has 'min' value 3 > 'max' value 1"
        );
    }

    #[test]
    fn test_invalid_display_is_transparent() {
        let err = CsvError::Invalid("input 'test' line 4: unexpected data".to_string());
        assert_eq!(err.to_string(), "input 'test' line 4: unexpected data");
    }

    #[test]
    fn test_continuable_classification() {
        assert!(CsvError::Record("input 'x' line 1: bad value".to_string()).is_continuable());
        assert!(!CsvError::Invalid("broken".to_string()).is_continuable());
        assert!(!CsvError::Schema("broken".to_string()).is_continuable());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CsvError>();
    }
}
