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

//! Common view of a record or group declaration.
//!
//! Each format crate compiles its serde-facing schema structs into an
//! `Arc`-linked declaration tree and implements [`RecDecl`] on the compiled
//! type. The engine consumes declarations exclusively through this trait;
//! format-specific payload (columns, fields, envelope regexes) stays behind
//! it and is only touched by the format's own record source.

use std::sync::Arc;

/// Name and fqdn of the synthetic root declaration every validator creates.
pub const ROOT_NAME: &str = "#root";

/// Sentinel for an unbounded `max` occurrence count.
pub const UNBOUNDED: usize = usize::MAX;

/// A node of a compiled declaration tree.
///
/// Invariants the validators establish before the engine ever sees a tree:
/// a group has at least one child and no payload; `min_occurs <=
/// max_occurs`; at most one declaration in the tree is a target; the root is
/// a non-target group named [`ROOT_NAME`] with `min = max = 1`.
pub trait RecDecl: Sized {
    /// The declaration's own name.
    fn name(&self) -> &str;

    /// Slash-joined path of names from the schema root, for error context.
    /// Root-level declarations have `fqdn() == name()`.
    fn fqdn(&self) -> &str;

    /// Whether subtrees of this declaration are the parser's output.
    fn is_target(&self) -> bool;

    /// Whether this declaration is a payload-less container.
    fn is_group(&self) -> bool;

    /// Minimum number of instances per containing parent instance.
    fn min_occurs(&self) -> usize;

    /// Maximum number of instances per containing parent instance
    /// ([`UNBOUNDED`] if the schema leaves it open).
    fn max_occurs(&self) -> usize;

    /// Child declarations, in schema order.
    fn children(&self) -> &[Arc<Self>];
}

/// Join a parent fqdn and a declaration name with the `/` separator.
///
/// An empty `parent` yields the bare name, so root-level declarations get
/// `fqdn == name`.
pub fn build_fqdn(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
