// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Order-statistic red-black tree
//!
//! Every node counts the elements in its left and right subtrees, which
//! makes rank queries and k-th element lookups logarithmic. Equal keys are
//! all kept; a new key goes after the existing equal ones.

use std::fmt;
use std::ops::Index;

const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
struct Node<K> {
    key: K,
    color: Color,
    parent: usize,
    left: usize,
    right: usize,
    left_count: usize,
    right_count: usize,
}

/// Handle to an inserted element, valid until that element is erased
///
/// The generation tells a handle to an erased element apart from a handle to
/// a later element stored in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankHandle {
    slot: usize,
    generation: u32,
}

#[derive(Clone)]
pub struct RankTree<K> {
    slots: Vec<Option<Node<K>>>,
    // bumped every time a slot is freed
    generations: Vec<u32>,
    free: Vec<usize>,
    root: usize,
    len: usize,
}

impl<K: PartialOrd> RankTree<K> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            root: NIL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.generations.clear();
        self.free.clear();
        self.root = NIL;
        self.len = 0;
    }

    pub fn insert(&mut self, key: K) -> RankHandle {
        let mut parent = NIL;
        let mut go_left = false;
        let mut x = self.root;
        while x != NIL {
            parent = x;
            let node = self.node_mut(x);
            go_left = key < node.key;
            if go_left {
                node.left_count += 1;
                x = node.left;
            } else {
                node.right_count += 1;
                x = node.right;
            }
        }

        let z = self.alloc(Node {
            key,
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
            left_count: 0,
            right_count: 0,
        });
        if parent == NIL {
            self.root = z;
        } else if go_left {
            self.node_mut(parent).left = z;
        } else {
            self.node_mut(parent).right = z;
        }
        self.len += 1;
        self.insert_fixup(z);
        RankHandle {
            slot: z,
            generation: self.generations[z],
        }
    }

    /// Removes the leftmost element equal to `key`.
    pub fn erase(&mut self, key: &K) -> bool {
        let mut found = NIL;
        let mut x = self.root;
        while x != NIL {
            let node = self.node(x);
            if node.key < *key {
                x = node.right;
            } else {
                if !(*key < node.key) {
                    found = x;
                }
                x = node.left;
            }
        }
        if found == NIL {
            return false;
        }
        self.remove(found);
        true
    }

    /// Removes the element behind `handle` and returns its key.
    pub fn erase_handle(&mut self, handle: RankHandle) -> K {
        assert!(self.is_live(handle), "stale rank tree handle {:?}", handle);
        self.remove(handle.slot)
    }

    /// Element with rank `rank` (0 is the smallest).
    pub fn get(&self, rank: usize) -> Option<&K> {
        if rank >= self.len {
            return None;
        }
        let mut x = self.root;
        let mut r = rank;
        loop {
            let node = self.node(x);
            if r < node.left_count {
                x = node.left;
            } else if r == node.left_count {
                return Some(&node.key);
            } else {
                r -= node.left_count + 1;
                x = node.right;
            }
        }
    }

    /// Number of elements strictly less than `key`.
    pub fn lower_rank(&self, key: &K) -> usize {
        let mut rank = 0;
        let mut x = self.root;
        while x != NIL {
            let node = self.node(x);
            if node.key < *key {
                rank += node.left_count + 1;
                x = node.right;
            } else {
                x = node.left;
            }
        }
        rank
    }

    /// Number of elements less than or equal to `key`.
    pub fn upper_rank(&self, key: &K) -> usize {
        let mut rank = 0;
        let mut x = self.root;
        while x != NIL {
            let node = self.node(x);
            if *key < node.key {
                x = node.left;
            } else {
                rank += node.left_count + 1;
                x = node.right;
            }
        }
        rank
    }

    pub fn rank_of(&self, handle: RankHandle) -> usize {
        assert!(self.is_live(handle), "stale rank tree handle {:?}", handle);
        let mut x = handle.slot;
        let mut rank = self.node(x).left_count;
        while self.node(x).parent != NIL {
            let parent = self.node(x).parent;
            if self.node(parent).right == x {
                rank += self.node(parent).left_count + 1;
            }
            x = parent;
        }
        rank
    }

    pub fn key(&self, handle: RankHandle) -> &K {
        assert!(self.is_live(handle), "stale rank tree handle {:?}", handle);
        &self.node(handle.slot).key
    }

    /// Keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            tree: self,
            next: if self.root == NIL { NIL } else { self.minimum(self.root) },
            remaining: self.len,
        }
    }

    fn is_live(&self, handle: RankHandle) -> bool {
        matches!(self.slots.get(handle.slot), Some(Some(_)))
            && self.generations[handle.slot] == handle.generation
    }

    fn node(&self, i: usize) -> &Node<K> {
        match &self.slots[i] {
            Some(node) => node,
            None => panic!("rank tree slot {} is free", i),
        }
    }

    fn node_mut(&mut self, i: usize) -> &mut Node<K> {
        match &mut self.slots[i] {
            Some(node) => node,
            None => panic!("rank tree slot {} is free", i),
        }
    }

    fn alloc(&mut self, node: Node<K>) -> usize {
        match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(node);
                i
            }
            None => {
                self.slots.push(Some(node));
                self.generations.push(0);
                self.slots.len() - 1
            }
        }
    }

    fn is_red(&self, i: usize) -> bool {
        i != NIL && self.node(i).color == Color::Red
    }

    fn set_color(&mut self, i: usize, color: Color) {
        if i != NIL {
            self.node_mut(i).color = color;
        }
    }

    fn size(&self, i: usize) -> usize {
        if i == NIL {
            0
        } else {
            let node = self.node(i);
            node.left_count + node.right_count + 1
        }
    }

    fn minimum(&self, mut x: usize) -> usize {
        while self.node(x).left != NIL {
            x = self.node(x).left;
        }
        x
    }

    fn successor(&self, mut x: usize) -> usize {
        if self.node(x).right != NIL {
            return self.minimum(self.node(x).right);
        }
        let mut parent = self.node(x).parent;
        while parent != NIL && self.node(parent).right == x {
            x = parent;
            parent = self.node(x).parent;
        }
        parent
    }

    /// Points the link that held `old` at `new`.
    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if parent == NIL {
            self.root = new;
        } else if self.node(parent).left == old {
            self.node_mut(parent).left = new;
        } else {
            self.node_mut(parent).right = new;
        }
        if new != NIL {
            self.node_mut(new).parent = parent;
        }
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.node(x).right;
        let y_left = self.node(y).left;
        let parent = self.node(x).parent;

        self.node_mut(x).right = y_left;
        if y_left != NIL {
            self.node_mut(y_left).parent = x;
        }
        self.replace_child(parent, x, y);
        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;

        let moved = self.node(y).left_count;
        self.node_mut(x).right_count = moved;
        let x_size = self.size(x);
        self.node_mut(y).left_count = x_size;
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.node(x).left;
        let y_right = self.node(y).right;
        let parent = self.node(x).parent;

        self.node_mut(x).left = y_right;
        if y_right != NIL {
            self.node_mut(y_right).parent = x;
        }
        self.replace_child(parent, x, y);
        self.node_mut(y).right = x;
        self.node_mut(x).parent = y;

        let moved = self.node(y).right_count;
        self.node_mut(x).left_count = moved;
        let x_size = self.size(x);
        self.node_mut(y).right_count = x_size;
    }

    fn insert_fixup(&mut self, mut z: usize) {
        while self.is_red(self.node(z).parent) {
            let parent = self.node(z).parent;
            let grand = self.node(parent).parent;
            if parent == self.node(grand).left {
                let uncle = self.node(grand).right;
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                } else {
                    if z == self.node(parent).right {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.node(z).parent;
                    let grand = self.node(parent).parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.node(grand).left;
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                } else {
                    if z == self.node(parent).left {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.node(z).parent;
                    let grand = self.node(parent).parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_left(grand);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    fn remove(&mut self, z: usize) -> K {
        let (z_left, z_right) = (self.node(z).left, self.node(z).right);

        // the node that leaves its position in the tree
        let spliced = if z_left == NIL || z_right == NIL {
            z
        } else {
            self.minimum(z_right)
        };
        let mut child = spliced;
        let mut up = self.node(spliced).parent;
        while up != NIL {
            let node = self.node_mut(up);
            if node.left == child {
                node.left_count -= 1;
            } else {
                node.right_count -= 1;
            }
            child = up;
            up = self.node(up).parent;
        }

        let removed_color;
        let x;
        let x_parent;
        if spliced == z {
            removed_color = self.node(z).color;
            x = if z_left == NIL { z_right } else { z_left };
            x_parent = self.node(z).parent;
            self.replace_child(x_parent, z, x);
        } else {
            let y = spliced;
            removed_color = self.node(y).color;
            x = self.node(y).right;
            if self.node(y).parent == z {
                x_parent = y;
            } else {
                x_parent = self.node(y).parent;
                self.replace_child(x_parent, y, x);
                self.node_mut(y).right = z_right;
                self.node_mut(z_right).parent = y;
            }
            let z_parent = self.node(z).parent;
            self.replace_child(z_parent, z, y);
            self.node_mut(y).left = z_left;
            self.node_mut(z_left).parent = y;

            let (color, left_count, right_count) = {
                let node = self.node(z);
                (node.color, node.left_count, node.right_count)
            };
            let node = self.node_mut(y);
            node.color = color;
            node.left_count = left_count;
            node.right_count = right_count;
        }

        if removed_color == Color::Black {
            self.erase_fixup(x, x_parent);
        }

        self.len -= 1;
        self.free.push(z);
        self.generations[z] = self.generations[z].wrapping_add(1);
        match self.slots[z].take() {
            Some(node) => node.key,
            None => unreachable!("removed node was live"),
        }
    }

    fn erase_fixup(&mut self, mut x: usize, mut parent: usize) {
        while x != self.root && !self.is_red(x) {
            if x == self.node(parent).left {
                let mut w = self.node(parent).right;
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    w = self.node(parent).right;
                }
                if !self.is_red(self.node(w).left) && !self.is_red(self.node(w).right) {
                    self.set_color(w, Color::Red);
                    x = parent;
                    parent = self.node(x).parent;
                } else {
                    if !self.is_red(self.node(w).right) {
                        let w_left = self.node(w).left;
                        self.set_color(w_left, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.node(parent).right;
                    }
                    let parent_color = self.node(parent).color;
                    self.set_color(w, parent_color);
                    self.set_color(parent, Color::Black);
                    let w_right = self.node(w).right;
                    self.set_color(w_right, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut w = self.node(parent).left;
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    w = self.node(parent).left;
                }
                if !self.is_red(self.node(w).left) && !self.is_red(self.node(w).right) {
                    self.set_color(w, Color::Red);
                    x = parent;
                    parent = self.node(x).parent;
                } else {
                    if !self.is_red(self.node(w).left) {
                        let w_right = self.node(w).right;
                        self.set_color(w_right, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.node(parent).left;
                    }
                    let parent_color = self.node(parent).color;
                    self.set_color(w, parent_color);
                    self.set_color(parent, Color::Black);
                    let w_left = self.node(w).left;
                    self.set_color(w_left, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    /// Checks coloring, parent links and subtree counts; returns the black
    /// height.
    #[cfg(test)]
    fn validate(&self) -> usize {
        fn walk<K: PartialOrd>(tree: &RankTree<K>, x: usize, parent: usize) -> (usize, usize) {
            if x == NIL {
                return (0, 1);
            }
            let node = tree.node(x);
            assert_eq!(node.parent, parent, "parent link");
            if node.color == Color::Red {
                assert!(!tree.is_red(node.left) && !tree.is_red(node.right), "red node with red child");
            }
            let (left_size, left_black) = walk(tree, node.left, x);
            let (right_size, right_black) = walk(tree, node.right, x);
            assert_eq!(node.left_count, left_size, "left count");
            assert_eq!(node.right_count, right_size, "right count");
            assert_eq!(left_black, right_black, "black height");
            let black = left_black + usize::from(node.color == Color::Black);
            (left_size + right_size + 1, black)
        }
        assert!(!self.is_red(self.root));
        let (size, black) = walk(self, self.root, NIL);
        assert_eq!(size, self.len);
        black
    }
}

impl<K: PartialOrd> Default for RankTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialOrd> Index<usize> for RankTree<K> {
    type Output = K;

    fn index(&self, rank: usize) -> &K {
        match self.get(rank) {
            Some(key) => key,
            None => panic!("rank {} out of range for {} elements", rank, self.len),
        }
    }
}

impl<K: PartialOrd + fmt::Debug> fmt::Debug for RankTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: PartialOrd> FromIterator<K> for RankTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        for key in iter {
            tree.insert(key);
        }
        tree
    }
}

/// In-order iterator over a [`RankTree`]
pub struct Iter<'a, K> {
    tree: &'a RankTree<K>,
    next: usize,
    remaining: usize,
}

impl<'a, K: PartialOrd> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        if self.next == NIL {
            return None;
        }
        let tree = self.tree;
        let current = self.next;
        self.next = tree.successor(current);
        self.remaining -= 1;
        Some(&tree.node(current).key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: PartialOrd> IntoIterator for &'a RankTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}
