// Copyright 2015 Google Inc. All rights reserved.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Arena tree used by both parsing passes and by the renderer.
//!
//! Nodes live in one vector and link to their first child and next sibling
//! by index. Building happens in preorder: `append` adds a sibling after the
//! focus, `push` descends into the focus, and `pop` climbs back out. The
//! ancestors of the focus are kept on the spine.

use std::num::NonZeroUsize;
use std::ops::{Add, Index, IndexMut, Sub};

/// Index of a node. Zero is reserved for the dummy root, which lets the
/// index use `NonZeroUsize` and keeps `Option<TreeIndex>` one word wide.
#[derive(Debug, Eq, PartialEq, Copy, Clone, PartialOrd)]
pub(crate) struct TreeIndex(NonZeroUsize);

impl TreeIndex {
    fn new(i: usize) -> Self {
        TreeIndex(NonZeroUsize::new(i).unwrap())
    }

    pub(crate) fn get(self) -> usize {
        self.0.get()
    }
}

impl Add<usize> for TreeIndex {
    type Output = TreeIndex;

    fn add(self, rhs: usize) -> Self {
        TreeIndex::new(self.get() + rhs)
    }
}

impl Sub<usize> for TreeIndex {
    type Output = TreeIndex;

    fn sub(self, rhs: usize) -> Self {
        TreeIndex::new(self.get().checked_sub(rhs).unwrap())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Node<T> {
    pub child: Option<TreeIndex>,
    pub next: Option<TreeIndex>,
    pub item: T,
}

#[derive(Clone)]
pub(crate) struct Tree<T> {
    nodes: Vec<Node<T>>,
    /// Ancestors of the focus, outermost first.
    spine: Vec<TreeIndex>,
    cur: Option<TreeIndex>,
}

impl<T: Default> Tree<T> {
    pub(crate) fn with_capacity(cap: usize) -> Tree<T> {
        let mut nodes = Vec::with_capacity(cap.max(1));
        // dummy root at index zero; its item stands for the document
        nodes.push(Node {
            child: None,
            next: None,
            item: T::default(),
        });
        Tree {
            nodes,
            spine: Vec::new(),
            cur: None,
        }
    }

    /// The node in focus, or `None` when the focus sits after the last child
    /// of the innermost open node.
    pub(crate) fn cur(&self) -> Option<TreeIndex> {
        self.cur
    }

    /// Adds `item` after the focus (or as first child of the innermost open
    /// node when nothing is focused) and moves the focus to it.
    pub(crate) fn append(&mut self, item: T) -> TreeIndex {
        let ix = self.create_node(item);

        if let Some(prev) = self.cur {
            self[prev].next = Some(ix);
        } else if let Some(&parent) = self.spine.last() {
            self[parent].child = Some(ix);
        }
        self.cur = Some(ix);
        ix
    }

    /// Creates a node that is not yet linked anywhere.
    pub(crate) fn create_node(&mut self, item: T) -> TreeIndex {
        let ix = TreeIndex::new(self.nodes.len());
        self.nodes.push(Node {
            child: None,
            next: None,
            item,
        });
        ix
    }

    /// Descends into the focused node. New items become its children.
    pub(crate) fn push(&mut self) -> TreeIndex {
        let cur_ix = self.cur.unwrap();
        self.spine.push(cur_ix);
        self.cur = self[cur_ix].child;
        cur_ix
    }

    /// Climbs back out, focusing the node that was pushed last.
    pub(crate) fn pop(&mut self) -> Option<TreeIndex> {
        let ix = self.spine.pop()?;
        self.cur = Some(ix);
        Some(ix)
    }

    pub(crate) fn peek_up(&self) -> Option<TreeIndex> {
        self.spine.last().copied()
    }

    pub(crate) fn peek_grandparent(&self) -> Option<TreeIndex> {
        let len = self.spine.len();
        if len >= 2 {
            Some(self.spine[len - 2])
        } else {
            None
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub(crate) fn spine_len(&self) -> usize {
        self.spine.len()
    }

    /// Focuses the first top-level node and clears the spine.
    pub(crate) fn reset(&mut self) {
        self.cur = if self.is_empty() {
            None
        } else {
            Some(TreeIndex::new(1))
        };
        self.spine.clear();
    }

    /// Ancestors of the focus, outermost first.
    pub(crate) fn walk_spine(&self) -> impl DoubleEndedIterator<Item = &TreeIndex> {
        self.spine.iter()
    }

    /// Moves the focus to the sibling after `cur_ix`.
    pub(crate) fn next_sibling(&mut self, cur_ix: TreeIndex) -> Option<TreeIndex> {
        self.cur = self[cur_ix].next;
        self.cur
    }
}

impl<T> std::fmt::Debug for Tree<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // explicit stack so deep documents cannot overflow the call stack
        let mut stack = Vec::new();
        if self.nodes.len() > 1 {
            stack.push((TreeIndex::new(1), 0));
        } else {
            return write!(f, "Empty tree");
        }
        while let Some((ix, depth)) = stack.pop() {
            writeln!(f, "{:width$}{:?}", "", &self[ix].item, width = depth * 2)?;
            if let Some(next) = self[ix].next {
                stack.push((next, depth));
            }
            if let Some(child) = self[ix].child {
                stack.push((child, depth + 1));
            }
        }
        Ok(())
    }
}

impl<T> Index<TreeIndex> for Tree<T> {
    type Output = Node<T>;

    fn index(&self, ix: TreeIndex) -> &Self::Output {
        self.nodes.index(ix.get())
    }
}

impl<T> IndexMut<TreeIndex> for Tree<T> {
    fn index_mut(&mut self, ix: TreeIndex) -> &mut Node<T> {
        self.nodes.index_mut(ix.get())
    }
}
