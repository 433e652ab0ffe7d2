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

//! Fixed-width front-end for the flatrec hierarchical record parser.
//!
//! Input lines are grouped into envelopes, either by a fixed row count
//! (`rows`, default 1) or by `header`/`footer` regex delimiters, and matched
//! against a hierarchy of envelope declarations. Column values are sliced
//! out of envelope lines by 1-based rune positions, so multi-byte input is
//! never split mid-character. [`Reader`] streams the input and emits one IDR
//! subtree per completed target declaration.

mod decl;
mod error;
mod reader;
mod validate;

pub use decl::{ColumnDecl, Envelope, EnvelopeDecl, FileDecl};
pub use error::{FixedLengthError, Result};
pub use reader::{FixedLengthSource, Reader};
