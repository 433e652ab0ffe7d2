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

//! Legacy fixed-length front-end for the flatrec hierarchical record
//! parser.
//!
//! Dispatches every input line to a record declaration by the line's first
//! three runes (the record name convention of legacy interchange formats
//! such as CWR: `HDR`, `NWR`, `TRL`, ...). Fields are rune-indexed slices
//! with optional defaults. Unlike the other front-ends, occurrence bounds
//! default to exactly one instance, and a schema with several root-level
//! records requires an explicit target.

mod decl;
mod error;
mod reader;
mod validate;

pub use decl::{FieldDecl, FileDecl, Record, RecordDecl};
pub use error::{FixedLengthAdvError, Result};
pub use reader::{AdvSource, Reader};
