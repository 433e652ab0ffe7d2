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

//! The hierarchy-driven matching engine.
//!
//! [`HierarchyReader`] walks a compiled declaration tree in lock-step with a
//! record source: a stack of frames mirrors the path from the schema root to
//! the declaration currently being matched, each frame counting how many
//! instances of its declaration have completed. A match materializes an IDR
//! subtree and descends into the first child declaration; a non-match (or
//! exhausted input) advances to the next instance, sibling, or parent via
//! the mutually recursive `rec_done`/`rec_next` pair. Whenever a target
//! declaration completes an instance, its subtree is detached from the
//! in-progress tree and handed to the caller.
//!
//! One `read` call consumes exactly as much input as one target subtree
//! needs; the whole input is never buffered.

use crate::decl::RecDecl;
use crate::error::ReadError;
use crate::filter::TargetPredicate;
use crate::source::{MatchOutcome, RecordSource};
use flatrec_idr::{NodeId, NodeKind, Tree};
use std::sync::Arc;

const INITIAL_STACK_DEPTH: usize = 10;

struct StackEntry<D> {
    decl: Arc<D>,
    node: Option<NodeId>,
    cur_child: usize,
    occurred: usize,
}

impl<D> StackEntry<D> {
    fn new(decl: Arc<D>) -> Self {
        Self {
            decl,
            node: None,
            cur_child: 0,
            occurred: 0,
        }
    }
}

/// Pushdown automaton matching a record source against a declaration tree.
pub struct HierarchyReader<S: RecordSource> {
    source: S,
    tree: Tree,
    stack: Vec<StackEntry<S::Decl>>,
    target: Option<NodeId>,
    predicate: Option<Box<dyn TargetPredicate>>,
}

impl<S: RecordSource> HierarchyReader<S> {
    /// Create an engine over `source`, rooted at the validator-built
    /// synthetic root declaration.
    pub fn new(
        root: Arc<S::Decl>,
        source: S,
        predicate: Option<Box<dyn TargetPredicate>>,
    ) -> Self {
        let mut tree = Tree::new();
        let root_node = tree.create_node(NodeKind::Document, root.name());
        let first_child = root.children().first().cloned();
        let mut stack = Vec::with_capacity(INITIAL_STACK_DEPTH);
        let mut root_entry = StackEntry::new(root);
        root_entry.node = Some(root_node);
        stack.push(root_entry);
        if let Some(child) = first_child {
            stack.push(StackEntry::new(child));
        }
        Self {
            source,
            tree,
            stack,
            target: None,
            predicate,
        }
    }

    /// Assemble and return the next target subtree.
    ///
    /// `Ok(Some(node))` hands ownership of the detached subtree to the
    /// caller until [`release`](Self::release); an unreleased target is
    /// discarded by the next `read` call. `Ok(None)` is end of input; any
    /// error is fatal and the reader makes no further progress.
    pub fn read(&mut self) -> Result<Option<NodeId>, ReadError> {
        // Contain leaks in case the caller skipped release().
        if let Some(stale) = self.target.take() {
            self.tree.remove_and_release(stale);
        }
        loop {
            if let Some(target) = self.target {
                return Ok(Some(target));
            }
            if !self.source.has_more()? {
                if self.stack.len() <= 1 {
                    // Input exhausted and the declaration stack fully
                    // unwound: done.
                    return Ok(None);
                }
                // Input exhausted but declarations remain: drain them one
                // rec_next per iteration, so every min-occurs violation
                // surfaces and any target completed by the unwind is still
                // emitted. has_more() stays false once false, so the drain
                // re-enters here each iteration.
                self.rec_next()?;
                continue;
            }
            if self.stack.len() <= 1 {
                // Unprocessed input remains but every top-level declaration
                // has completed.
                return Err(ReadError::UnexpectedData);
            }
            let decl = Arc::clone(&self.top().decl);
            let Some(node) = self.read_rec(&decl)? else {
                // Current data is not an instance of this declaration; move
                // on and retry the same data against the next one.
                self.rec_next()?;
                continue;
            };
            self.top_mut().node = Some(node);
            // The node is a new instance of the top declaration, so it
            // attaches under the *parent* frame's node.
            let parent_node = self.entry(1).node.expect("parent frame has no node");
            self.tree.add_child(parent_node, node);
            if let Some(child) = decl.children().first() {
                let child = Arc::clone(child);
                self.stack.push(StackEntry::new(child));
                continue;
            }
            self.rec_done();
        }
    }

    /// Release a subtree previously returned by [`read`](Self::read).
    pub fn release(&mut self, node: NodeId) {
        if self.target == Some(node) {
            self.target = None;
        }
        self.tree.remove_and_release(node);
    }

    /// The tree arena holding emitted and in-progress subtrees.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The underlying record source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The underlying record source, mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Match the pending record against `decl`.
    ///
    /// A group declaration is probed through its leftmost non-group
    /// descendant without consuming the record; on a hit the group's own
    /// element node is synthesized here and the concrete leaf is matched
    /// again in a later iteration once the stack has descended to it.
    fn read_rec(&mut self, decl: &Arc<S::Decl>) -> Result<Option<NodeId>, ReadError> {
        let mut leaf = Arc::clone(decl);
        while leaf.is_group() && !leaf.children().is_empty() {
            let child = Arc::clone(&leaf.children()[0]);
            leaf = child;
        }
        if leaf.is_group() {
            // No concrete record to match against.
            return Ok(None);
        }
        let create_node = !decl.is_group();
        match self.source.read_and_match(&leaf, create_node, &mut self.tree)? {
            MatchOutcome::NoMatch => Ok(None),
            MatchOutcome::Matched => {
                Ok(Some(self.tree.create_node(NodeKind::Element, decl.name())))
            }
            MatchOutcome::Materialized(node) => Ok(Some(node)),
        }
    }

    /// Wrap up one completed instance of the top declaration: bump its
    /// occurrence count, emit it if it is the target, and stay on it for
    /// further instances while `max` allows. Potentially recursive:
    /// `rec_done` -> `rec_next` -> `rec_done` -> ...
    fn rec_done(&mut self) {
        let top = self.top_mut();
        top.cur_child = 0;
        top.occurred += 1;
        let decl = Arc::clone(&top.decl);
        if decl.is_target() {
            assert!(self.target.is_none(), "pending target not yet consumed");
            let node = self
                .top_mut()
                .node
                .take()
                .expect("target completed without a node");
            let emit = self
                .predicate
                .as_ref()
                .map_or(true, |p| p.matches(&self.tree, node));
            if emit {
                self.tree.detach(node);
                self.target = Some(node);
            } else {
                self.tree.remove_and_release(node);
            }
        }
        if self.top().occurred < decl.max_occurs() {
            return;
        }
        // occurred reached max; validation guarantees min <= max, so this
        // rec_next cannot underflow.
        let _ = self.rec_next();
    }

    /// Advance past the top declaration: to its next sibling if one exists,
    /// otherwise complete the parent. Fails if the declaration underflowed
    /// its `min` bound. Potentially recursive:
    /// `rec_next` -> `rec_done` -> `rec_next` -> ...
    fn rec_next(&mut self) -> Result<(), ReadError> {
        let top = self.top();
        if top.occurred < top.decl.min_occurs() {
            return Err(ReadError::FewerThanMinOccurs {
                fqdn: top.decl.fqdn().to_string(),
                min: top.decl.min_occurs(),
                actual: top.occurred,
            });
        }
        if self.stack.len() <= 1 {
            // Only the root remains; the EOF drain ends here.
            return Ok(());
        }
        self.stack.pop();
        let parent_decl = Arc::clone(&self.top().decl);
        let next_child = self.top().cur_child + 1;
        if next_child < parent_decl.children().len() {
            self.top_mut().cur_child = next_child;
            let next = Arc::clone(&parent_decl.children()[next_child]);
            self.stack.push(StackEntry::new(next));
            return Ok(());
        }
        self.rec_done();
        Ok(())
    }

    fn top(&self) -> &StackEntry<S::Decl> {
        self.stack.last().expect("declaration stack is empty")
    }

    fn top_mut(&mut self) -> &mut StackEntry<S::Decl> {
        self.stack.last_mut().expect("declaration stack is empty")
    }

    /// The `nth` frame from the top of the stack.
    fn entry(&self, nth: usize) -> &StackEntry<S::Decl> {
        assert!(nth < self.stack.len(), "frame {nth} requested, but stack length is {}", self.stack.len());
        &self.stack[self.stack.len() - nth - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{build_fqdn, RecDecl, ROOT_NAME, UNBOUNDED};
    use std::collections::VecDeque;

    /// Minimal compiled declaration for engine tests: records are matched
    /// by name, like the legacy fixed-length front-end does.
    struct TestDecl {
        name: String,
        fqdn: String,
        target: bool,
        group: bool,
        min: usize,
        max: usize,
        children: Vec<Arc<TestDecl>>,
    }

    impl TestDecl {
        fn rec(name: &str, min: usize, max: usize) -> TestDecl {
            TestDecl {
                name: name.to_string(),
                fqdn: name.to_string(),
                target: false,
                group: false,
                min,
                max,
                children: Vec::new(),
            }
        }

        fn group(name: &str, min: usize, max: usize, children: Vec<TestDecl>) -> TestDecl {
            TestDecl {
                name: name.to_string(),
                fqdn: name.to_string(),
                target: false,
                group: true,
                min,
                max,
                children: children.into_iter().map(Arc::new).collect(),
            }
        }

        fn target(mut self) -> TestDecl {
            self.target = true;
            self
        }

        fn with_children(mut self, children: Vec<TestDecl>) -> TestDecl {
            self.children = children.into_iter().map(Arc::new).collect();
            self
        }

        fn root(decls: Vec<TestDecl>) -> Arc<TestDecl> {
            let mut root = TestDecl::group(ROOT_NAME, 1, 1, vec![]);
            let mut decls = decls;
            for d in &mut decls {
                fix_fqdn(d, "");
            }
            root.children = decls.into_iter().map(Arc::new).collect();
            Arc::new(root)
        }
    }

    fn fix_fqdn(decl: &mut TestDecl, parent: &str) {
        decl.fqdn = build_fqdn(parent, &decl.name);
        let children = std::mem::take(&mut decl.children);
        decl.children = children
            .into_iter()
            .map(|c| {
                let mut c = Arc::try_unwrap(c).unwrap_or_else(|_| panic!("shared test decl"));
                fix_fqdn(&mut c, &decl.fqdn);
                Arc::new(c)
            })
            .collect();
    }

    impl RecDecl for TestDecl {
        fn name(&self) -> &str {
            &self.name
        }
        fn fqdn(&self) -> &str {
            &self.fqdn
        }
        fn is_target(&self) -> bool {
            self.target
        }
        fn is_group(&self) -> bool {
            self.group
        }
        fn min_occurs(&self) -> usize {
            self.min
        }
        fn max_occurs(&self) -> usize {
            self.max
        }
        fn children(&self) -> &[Arc<TestDecl>] {
            &self.children
        }
    }

    /// Scripted source: a queue of record names, matched by equality.
    struct TestSource {
        records: VecDeque<String>,
    }

    impl TestSource {
        fn new(records: &[&str]) -> TestSource {
            TestSource {
                records: records.iter().map(|r| r.to_string()).collect(),
            }
        }
    }

    impl RecordSource for TestSource {
        type Decl = TestDecl;

        fn has_more(&mut self) -> Result<bool, ReadError> {
            Ok(!self.records.is_empty())
        }

        fn read_and_match(
            &mut self,
            decl: &TestDecl,
            create_node: bool,
            tree: &mut Tree,
        ) -> Result<MatchOutcome, ReadError> {
            let Some(front) = self.records.front() else {
                return Ok(MatchOutcome::NoMatch);
            };
            if front != &decl.name {
                return Ok(MatchOutcome::NoMatch);
            }
            if !create_node {
                return Ok(MatchOutcome::Matched);
            }
            let rec = self.records.pop_front().expect("queue emptied under us");
            let node = tree.create_node(NodeKind::Element, &decl.name);
            let text = tree.create_node(NodeKind::Text, rec);
            tree.add_child(node, text);
            Ok(MatchOutcome::Materialized(node))
        }
    }

    fn reader(
        decls: Vec<TestDecl>,
        records: &[&str],
    ) -> HierarchyReader<TestSource> {
        HierarchyReader::new(TestDecl::root(decls), TestSource::new(records), None)
    }

    fn read_all(r: &mut HierarchyReader<TestSource>) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            match r.read() {
                Ok(Some(n)) => {
                    out.push(r.tree().subtree_to_string(n));
                    r.release(n);
                }
                Ok(None) => return out,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
    }

    // ==================== Basic sequencing ====================

    #[test]
    fn test_single_unbounded_target() {
        let mut r = reader(
            vec![TestDecl::rec("A", 0, UNBOUNDED).target()],
            &["A", "A", "A"],
        );
        let out = read_all(&mut r);
        assert_eq!(out, vec!["<A>A</A>", "<A>A</A>", "<A>A</A>"]);
    }

    #[test]
    fn test_empty_input_is_eof() {
        let mut r = reader(vec![TestDecl::rec("A", 0, UNBOUNDED).target()], &[]);
        assert_eq!(r.read().unwrap(), None);
        // EOF is sticky.
        assert_eq!(r.read().unwrap(), None);
    }

    #[test]
    fn test_siblings_in_declaration_order() {
        let mut r = reader(
            vec![
                TestDecl::group(
                    "G",
                    0,
                    UNBOUNDED,
                    vec![TestDecl::rec("A", 1, 1), TestDecl::rec("B", 1, 1)],
                )
                .target(),
            ],
            &["A", "B", "A", "B"],
        );
        let out = read_all(&mut r);
        assert_eq!(out, vec!["<G><A>A</A><B>B</B></G>", "<G><A>A</A><B>B</B></G>"]);
    }

    #[test]
    fn test_optional_child_skipped() {
        let p = TestDecl::rec("P", 0, UNBOUNDED)
            .target()
            .with_children(vec![TestDecl::rec("A", 0, 1), TestDecl::rec("B", 1, 1)]);
        let mut r = reader(vec![p], &["P", "B", "P", "A", "B"]);
        let out = read_all(&mut r);
        assert_eq!(
            out,
            vec!["<P>P<B>B</B></P>", "<P>P<A>A</A><B>B</B></P>"]
        );
    }

    #[test]
    fn test_nested_records() {
        let parent = TestDecl::rec("P", 0, UNBOUNDED)
            .target()
            .with_children(vec![TestDecl::rec("C", 0, UNBOUNDED)]);
        let mut r = reader(vec![parent], &["P", "C", "C", "P", "C"]);
        let out = read_all(&mut r);
        assert_eq!(
            out,
            vec!["<P>P<C>C</C><C>C</C></P>", "<P>P<C>C</C></P>"]
        );
    }

    // ==================== Group handling ====================

    #[test]
    fn test_group_node_is_synthesized() {
        let mut r = reader(
            vec![TestDecl::group("G", 1, 1, vec![TestDecl::rec("A", 1, 1)]).target()],
            &["A"],
        );
        let out = read_all(&mut r);
        assert_eq!(out, vec!["<G><A>A</A></G>"]);
    }

    #[test]
    fn test_nested_groups_probe_leftmost_leaf() {
        let inner = TestDecl::group("inner", 1, 1, vec![TestDecl::rec("A", 1, 1)]);
        let outer = TestDecl::group("outer", 1, 1, vec![inner]).target();
        let mut r = reader(vec![outer], &["A"]);
        let out = read_all(&mut r);
        assert_eq!(out, vec!["<outer><inner><A>A</A></inner></outer>"]);
    }

    #[test]
    fn test_group_match_keys_on_leftmost_leaf() {
        // A group matches only through its first non-group descendant, so
        // input starting with the second child does not enter the group.
        let g = TestDecl::group(
            "G",
            0,
            1,
            vec![TestDecl::rec("A", 0, 1), TestDecl::rec("B", 0, 1)],
        );
        let b = TestDecl::rec("B", 1, 1).target();
        let mut r = reader(vec![g, b], &["B"]);
        let out = read_all(&mut r);
        assert_eq!(out, vec!["<B>B</B>"]);
    }

    #[test]
    fn test_group_not_entered_when_leaf_does_not_match() {
        let g = TestDecl::group("G", 0, 1, vec![TestDecl::rec("A", 1, 1)]);
        let b = TestDecl::rec("B", 1, 1).target();
        let mut r = reader(vec![g, b], &["B"]);
        let out = read_all(&mut r);
        assert_eq!(out, vec!["<B>B</B>"]);
    }

    // ==================== Occurrence bounds ====================

    #[test]
    fn test_max_occurs_bounds_instances() {
        // A absorbs at most 2; the third A has nowhere to go.
        let mut r = reader(
            vec![TestDecl::rec("A", 0, 2).target()],
            &["A", "A", "A"],
        );
        assert!(r.read().unwrap().is_some());
        let n = r.read().unwrap().expect("second target");
        r.release(n);
        assert_eq!(r.read(), Err(ReadError::UnexpectedData));
    }

    #[test]
    fn test_min_occurs_underflow_mid_input() {
        let g = TestDecl::group(
            "P",
            0,
            UNBOUNDED,
            vec![TestDecl::rec("C", 2, 2), TestDecl::rec("D", 0, 1)],
        )
        .target();
        let mut r = reader(vec![g], &["C", "D"]);
        assert_eq!(
            r.read(),
            Err(ReadError::FewerThanMinOccurs {
                fqdn: "P/C".to_string(),
                min: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_min_occurs_underflow_at_eof() {
        let mut r = reader(vec![TestDecl::rec("A", 2, 2).target()], &["A"]);
        assert_eq!(
            r.read(),
            Err(ReadError::FewerThanMinOccurs {
                fqdn: "A".to_string(),
                min: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_eof_drain_emits_pending_parent_target() {
        // The target P can only complete once EOF proves no more C records
        // are coming.
        let p = TestDecl::rec("P", 1, 1)
            .target()
            .with_children(vec![TestDecl::rec("C", 0, UNBOUNDED)]);
        let mut r = reader(vec![p], &["P", "C"]);
        let n = r.read().unwrap().expect("target at EOF drain");
        assert_eq!(r.tree().subtree_to_string(n), "<P>P<C>C</C></P>");
        r.release(n);
        assert_eq!(r.read().unwrap(), None);
    }

    #[test]
    fn test_unexpected_data_after_declarations_complete() {
        let mut r = reader(vec![TestDecl::rec("A", 1, 1).target()], &["A", "A"]);
        let n = r.read().unwrap().expect("first target");
        r.release(n);
        assert_eq!(r.read(), Err(ReadError::UnexpectedData));
    }

    // ==================== Target ownership ====================

    #[test]
    fn test_unreleased_target_is_discarded_by_next_read() {
        let mut r = reader(
            vec![TestDecl::rec("A", 0, UNBOUNDED).target()],
            &["A", "A"],
        );
        let _first = r.read().unwrap().expect("first target");
        let live_with_target = r.tree().live_nodes();
        // Skip release; the next read must reclaim the first subtree on its
        // own before assembling the second.
        let second = r.read().unwrap().expect("second target");
        assert_eq!(r.tree().live_nodes(), live_with_target);
        r.release(second);
        assert_eq!(r.read().unwrap(), None);
    }

    #[test]
    fn test_release_returns_arena_to_steady_state() {
        let mut r = reader(
            vec![TestDecl::rec("A", 0, UNBOUNDED).target()],
            &["A", "A", "A"],
        );
        let baseline = 1; // the document root
        loop {
            match r.read().unwrap() {
                Some(n) => {
                    r.release(n);
                    assert_eq!(r.tree().live_nodes(), baseline);
                }
                None => break,
            }
        }
    }

    #[test]
    fn test_target_is_detached_when_emitted() {
        let mut r = reader(vec![TestDecl::rec("A", 1, 1).target()], &["A"]);
        let n = r.read().unwrap().expect("target");
        assert!(r.tree().parent(n).is_none());
    }

    // ==================== Target predicate ====================

    #[test]
    fn test_predicate_rejects_and_releases_targets() {
        let root = TestDecl::root(vec![TestDecl::rec("A", 0, UNBOUNDED).target()]);
        let predicate: Box<dyn TargetPredicate> =
            Box::new(|tree: &Tree, node: NodeId| tree.text(node) != "A");
        let mut r = HierarchyReader::new(root, TestSource::new(&["A", "A", "A"]), Some(predicate));
        // Every assembled subtree is rejected, so read runs through to EOF
        // and the rejected subtrees are reclaimed.
        assert_eq!(r.read().unwrap(), None);
        assert_eq!(r.tree().live_nodes(), 1);
    }

    #[test]
    fn test_predicate_accepting_passes_through() {
        let root = TestDecl::root(vec![TestDecl::rec("A", 0, UNBOUNDED).target()]);
        let predicate: Box<dyn TargetPredicate> = Box::new(|_: &Tree, _: NodeId| true);
        let mut r = HierarchyReader::new(root, TestSource::new(&["A"]), Some(predicate));
        assert!(r.read().unwrap().is_some());
    }

    // ==================== Non-target bookkeeping ====================

    #[test]
    fn test_non_target_subtrees_stay_attached_under_root() {
        // B is the target; A instances stay in the in-progress tree.
        let mut r = reader(
            vec![TestDecl::rec("A", 1, 1), TestDecl::rec("B", 1, 1).target()],
            &["A", "B"],
        );
        let n = r.read().unwrap().expect("target");
        assert_eq!(r.tree().subtree_to_string(n), "<B>B</B>");
        r.release(n);
        // root + A element + A text remain.
        assert_eq!(r.tree().live_nodes(), 3);
    }
}
