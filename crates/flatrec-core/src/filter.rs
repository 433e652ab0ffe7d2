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

//! Target emission predicate.
//!
//! The transform layer above the parsers can restrict which assembled target
//! subtrees are emitted (its path-expression engine lives outside this
//! workspace). The engine only needs a yes/no per candidate subtree, so the
//! seam is a plain predicate over the tree.

use flatrec_idr::{NodeId, Tree};

/// Decides whether an assembled target subtree is emitted or discarded.
pub trait TargetPredicate {
    /// `true` to emit the subtree rooted at `node`, `false` to release it.
    fn matches(&self, tree: &Tree, node: NodeId) -> bool;
}

impl<F> TargetPredicate for F
where
    F: Fn(&Tree, NodeId) -> bool,
{
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self(tree, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatrec_idr::NodeKind;

    #[test]
    fn test_closure_predicate() {
        let mut tree = Tree::new();
        let a = tree.create_node(NodeKind::Element, "a");
        let b = tree.create_node(NodeKind::Element, "b");

        let pred = |tree: &Tree, node: NodeId| tree.data(node) == "a";
        assert!(pred.matches(&tree, a));
        assert!(!pred.matches(&tree, b));
    }
}
