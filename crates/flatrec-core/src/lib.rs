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

//! Format-agnostic engine of the flatrec parsers.
//!
//! A flat-file schema is a tree of record and group declarations with
//! occurrence bounds. This crate provides the machinery every format
//! front-end shares:
//!
//! - [`RecDecl`]: the engine's uniform view of a compiled declaration;
//! - [`RecordSource`]: the cursor a format implements over its raw
//!   records (peek-availability plus match-and-optionally-materialize);
//! - [`HierarchyReader`]: the pushdown automaton that walks the
//!   declaration tree in lock-step with the input and streams out one IDR
//!   subtree per completed target declaration;
//! - [`ReadError`]: the engine's payload-first error values, rewrapped by
//!   the format crates with input and line context;
//! - [`caches::get_regex`]: the process-wide regex compile cache the
//!   validators share;
//! - [`TargetPredicate`]: the seam through which the layer above filters
//!   emitted target subtrees.
//!
//! The format crates (`flatrec-csv`, `flatrec-fixedlength`,
//! `flatrec-fixedlengthadv`) compile their serde schema structs into
//! `Arc`-linked declaration trees, implement [`RecordSource`], and wrap the
//! engine behind a small `Reader` facade.

pub mod caches;
mod decl;
mod error;
mod filter;
mod hierarchy;
mod source;

pub use decl::{build_fqdn, RecDecl, ROOT_NAME, UNBOUNDED};
pub use error::ReadError;
pub use filter::TargetPredicate;
pub use hierarchy::HierarchyReader;
pub use source::{MatchOutcome, RecordSource};
