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

//! Intermediate data representation (IDR) tree.
//!
//! The parsers in this workspace assemble their output as a mutable
//! element/text tree inside a [`Tree`] arena. Nodes are addressed by
//! [`NodeId`] handles; released slots are recycled through a free-list so a
//! long streaming parse does not grow the arena per emitted record.
//!
//! A subtree handed out by a parser stays alive inside the arena until it is
//! released, either explicitly or implicitly by the parser's next read.
//!
//! # Examples
//!
//! ```
//! use flatrec_idr::{NodeKind, Tree};
//!
//! let mut tree = Tree::new();
//! let row = tree.create_node(NodeKind::Element, "row");
//! let date = tree.create_node(NodeKind::Element, "date");
//! tree.add_child(row, date);
//! let value = tree.create_node(NodeKind::Text, "2020-01-01");
//! tree.add_child(date, value);
//!
//! assert_eq!(tree.text(row), "2020-01-01");
//! assert_eq!(tree.subtree_to_string(row), "<row><date>2020-01-01</date></row>");
//! ```

use std::fmt;

/// The kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root created by a parser. At most one per tree.
    Document,
    /// A named element; its `data` is the element name.
    Element,
    /// A text leaf; its `data` is the text content.
    Text,
}

/// Handle to a node inside a [`Tree`].
///
/// Ids are only meaningful for the tree that created them. A released id
/// must not be used again; the arena recycles its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    data: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    live: bool,
}

/// Arena holding one in-progress IDR tree.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<NodeData>,
    free: Vec<usize>,
    live: usize,
}

impl Tree {
    /// Create an empty tree arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new parentless node.
    pub fn create_node(&mut self, kind: NodeKind, data: impl Into<String>) -> NodeId {
        let data = NodeData {
            kind,
            data: data.into(),
            parent: None,
            children: Vec::new(),
            live: true,
        };
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = data;
                NodeId(slot)
            }
            None => {
                self.nodes.push(data);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Append `child` to `parent`'s child list.
    ///
    /// Panics if `child` already has a parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.node(child).parent.is_none(),
            "node {child} already has a parent"
        );
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Unlink `node` from its parent. The subtree stays alive.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else {
            return;
        };
        self.node_mut(node).parent = None;
        let children = &mut self.node_mut(parent).children;
        if let Some(pos) = children.iter().position(|c| *c == node) {
            children.remove(pos);
        }
    }

    /// Detach `node` and release its entire subtree back to the free-list.
    pub fn remove_and_release(&mut self, node: NodeId) {
        self.detach(node);
        self.release_subtree(node);
    }

    fn release_subtree(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.release_subtree(child);
        }
        let slot = self.node_mut(node);
        slot.live = false;
        slot.data.clear();
        slot.parent = None;
        self.live -= 1;
        self.free.push(node.0);
    }

    /// The node's kind.
    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.node(node).kind
    }

    /// The node's payload: element/document name, or text content.
    pub fn data(&self, node: NodeId) -> &str {
        &self.node(node).data
    }

    /// The node's parent, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// The node's children, in insertion order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// First child element with the given name.
    pub fn child_by_name(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.node(node)
            .children
            .iter()
            .copied()
            .find(|c| self.node(*c).kind == NodeKind::Element && self.node(*c).data == name)
    }

    /// Concatenated text content of the subtree, in document order.
    pub fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let data = self.node(node);
        if data.kind == NodeKind::Text {
            out.push_str(&data.data);
        }
        for child in &data.children {
            self.collect_text(*child, out);
        }
    }

    /// Deterministic XML-like rendering of the subtree.
    ///
    /// Used by tests to compare parse results structurally; this is not an
    /// XML serializer (no escaping).
    pub fn subtree_to_string(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_subtree(node, &mut out);
        out
    }

    fn write_subtree(&self, node: NodeId, out: &mut String) {
        let data = self.node(node);
        match data.kind {
            NodeKind::Text => out.push_str(&data.data),
            NodeKind::Document | NodeKind::Element => {
                out.push('<');
                out.push_str(&data.data);
                out.push('>');
                for child in &data.children {
                    self.write_subtree(*child, out);
                }
                out.push_str("</");
                out.push_str(&data.data);
                out.push('>');
            }
        }
    }

    /// Number of live (allocated, unreleased) nodes.
    pub fn live_nodes(&self) -> usize {
        self.live
    }

    fn node(&self, id: NodeId) -> &NodeData {
        let data = &self.nodes[id.0];
        assert!(data.live, "node {id} has been released");
        data
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        let data = &mut self.nodes[id.0];
        assert!(data.live, "node {id} has been released");
        data
    }
}
