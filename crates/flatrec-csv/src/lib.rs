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

//! CSV front-end for the flatrec hierarchical record parser.
//!
//! The schema's `csv2` file declaration describes a hierarchy of record and
//! record-group declarations, each matched against delimited rows by
//! per-column regexes. [`Reader`] streams the input and emits one IDR
//! subtree per completed target declaration.
//!
//! Rows may have unequal lengths (`flexible` tokenization). A column index
//! beyond a row's length counts as a match unless the column declares an
//! explicit `match` regex. Optionally, every `"` byte is replaced with `'`
//! before tokenization (`replace_double_quotes`) to cope with producers
//! that emit unbalanced quotes.

mod decl;
mod error;
mod reader;
mod validate;

pub use decl::{ColumnDecl, FileDecl, Record, RecordDecl};
pub use error::{CsvError, Result};
pub use reader::{CsvSource, Reader};
