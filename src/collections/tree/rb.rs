use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

use crate::collections::contiguous::Vector;
use crate::util::ext::OptionExtension;

/// Index of a node slot in the arena. `u32` halves the link overhead of a pointer-sized index
/// and still allows four billion entries.
pub(crate) type NodeId = u32;

/// The null index. Black by definition in every color check.
pub(crate) const NIL: NodeId = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

pub(crate) struct RbNode<K, V> {
    pub key: K,
    pub value: V,
    pub parent: NodeId,
    pub left: NodeId,
    pub right: NodeId,
    pub color: Color,
}

/// A red-black tree whose nodes live in a slot arena indexed by [`NodeId`].
///
/// The arena makes the mutually referencing node structure expressible without `Rc` cycles or
/// raw-pointer ownership: slots own their key/value, links are indices, and the parent link is a
/// non-owning back-reference used only for traversal and rebalancing. Removed slots go on a free
/// list and are reused by later insertions.
///
/// Invariants, checked by [`RbTree::check_invariants`] in tests:
/// - the root is black;
/// - a red node never has a red child;
/// - every path from the root to a missing child crosses the same number of black nodes.
///
/// Together these bound the height to `2 * log2(n + 1)`.
pub(crate) struct RbTree<K, V> {
    slots: Vector<Option<RbNode<K, V>>>,
    free: Vector<NodeId>,
    root: NodeId,
    len: usize,
}

impl<K, V> RbTree<K, V> {
    pub fn new() -> RbTree<K, V> {
        RbTree {
            slots: Vector::new(),
            free: Vector::new(),
            root: NIL,
            len: 0,
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every node. Slot storage is released rather than recycled.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = NIL;
        self.len = 0;
    }

    pub(crate) fn node(&self, id: NodeId) -> &RbNode<K, V> {
        // UNREACHABLE: Node ids are only produced by the arena and always reference occupied
        // slots; freed ids never escape.
        unsafe { self.slots.get(id as usize).as_ref().unreachable() }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut RbNode<K, V> {
        // UNREACHABLE: As for node.
        unsafe { self.slots.get_mut(id as usize).as_mut().unreachable() }
    }

    pub fn key(&self, id: NodeId) -> &K {
        &self.node(id).key
    }

    pub fn value(&self, id: NodeId) -> &V {
        &self.node(id).value
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.node_mut(id).value
    }

    /// The color of a slot, where the missing node is black by definition.
    fn color(&self, id: NodeId) -> Color {
        if id == NIL {
            Color::Black
        } else {
            self.node(id).color
        }
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        if id != NIL {
            self.node_mut(id).color = color;
        }
    }

    fn parent(&self, id: NodeId) -> NodeId {
        self.node(id).parent
    }

    fn left(&self, id: NodeId) -> NodeId {
        self.node(id).left
    }

    fn right(&self, id: NodeId) -> NodeId {
        self.node(id).right
    }

    /// Places a node in a vacant slot (reusing the free list where possible) and returns its id.
    ///
    /// # Panics
    /// Panics if the arena already holds `u32::MAX - 1` nodes.
    fn alloc(&mut self, node: RbNode<K, V>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots.replace(id as usize, Some(node));
                id
            },
            None => {
                let id = self.slots.len();
                if id >= NIL as usize {
                    panic!("Capacity overflow!");
                }
                self.slots.push(Some(node));
                id as NodeId
            },
        }
    }

    /// Empties a slot, returning its node and queueing the id for reuse.
    fn dealloc(&mut self, id: NodeId) -> RbNode<K, V> {
        self.free.push(id);
        // UNREACHABLE: Only occupied ids are deallocated, exactly once.
        unsafe { self.slots.replace(id as usize, None).unreachable() }
    }
}

impl<K, V> RbTree<K, V> {
    /// Finds the id holding `key`, or [`NIL`].
    pub fn get_id<Q>(&self, key: &Q) -> NodeId
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut curr = self.root;
        while curr != NIL {
            curr = match key.cmp(self.node(curr).key.borrow()) {
                Ordering::Less => self.left(curr),
                Ordering::Greater => self.right(curr),
                Ordering::Equal => return curr,
            };
        }
        NIL
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.get_id(key) {
            NIL => None,
            id => Some(self.value(id)),
        }
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.get_id(key) {
            NIL => None,
            id => Some(self.value_mut(id)),
        }
    }

    /// The leftmost id in the subtree rooted at `id`.
    fn min(&self, mut id: NodeId) -> NodeId {
        while self.left(id) != NIL {
            id = self.left(id);
        }
        id
    }

    /// The rightmost id in the subtree rooted at `id`.
    fn max(&self, mut id: NodeId) -> NodeId {
        while self.right(id) != NIL {
            id = self.right(id);
        }
        id
    }

    pub fn first_id(&self) -> NodeId {
        if self.root == NIL {
            NIL
        } else {
            self.min(self.root)
        }
    }

    pub fn last_id(&self) -> NodeId {
        if self.root == NIL {
            NIL
        } else {
            self.max(self.root)
        }
    }

    /// The id holding the next key in ascending order, or [`NIL`] past the end.
    ///
    /// Walks successor links: the minimum of the right subtree where one exists, otherwise up
    /// through parents until arriving from a left child. Amortized `O(1)` per step over a full
    /// traversal, with no auxiliary stack.
    pub fn successor(&self, id: NodeId) -> NodeId {
        if self.right(id) != NIL {
            return self.min(self.right(id));
        }

        let mut child = id;
        let mut up = self.parent(id);
        while up != NIL && child == self.right(up) {
            child = up;
            up = self.parent(up);
        }
        up
    }

    /// Inserts `key`/`value`, returning the previous value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: Ord,
    {
        let mut parent = NIL;
        let mut dir = Ordering::Equal;
        let mut curr = self.root;

        while curr != NIL {
            match key.cmp(&self.node(curr).key) {
                Ordering::Equal => {
                    return Some(mem::replace(&mut self.node_mut(curr).value, value));
                },
                ord => {
                    parent = curr;
                    dir = ord;
                    curr = if ord == Ordering::Less {
                        self.left(curr)
                    } else {
                        self.right(curr)
                    };
                },
            }
        }

        // A new node always starts red so the black-height invariant can't break; the fix-up
        // below repairs any red-red violation instead.
        let id = self.alloc(RbNode {
            key,
            value,
            parent,
            left: NIL,
            right: NIL,
            color: Color::Red,
        });

        if parent == NIL {
            self.root = id;
        } else if dir == Ordering::Less {
            self.node_mut(parent).left = id;
        } else {
            self.node_mut(parent).right = id;
        }

        self.len += 1;
        self.insert_fixup(id);
        None
    }

    /// Removes `key`, returning its entry if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.get_id(key) {
            NIL => None,
            id => Some(self.remove_id(id)),
        }
    }

    /// Removes and returns the smallest entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        match self.first_id() {
            NIL => None,
            id => Some(self.remove_id(id)),
        }
    }

    /// Removes and returns the largest entry.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        match self.last_id() {
            NIL => None,
            id => Some(self.remove_id(id)),
        }
    }

    /// Unlinks the node at `id` and returns its entry.
    pub fn remove_id(&mut self, mut id: NodeId) -> (K, V) {
        if self.left(id) != NIL && self.right(id) != NIL {
            // Two children: trade payloads with the in-order successor (which has no left child)
            // and delete at the successor's position instead. Links and colors stay put, so the
            // tree's shape invariants are untouched by the swap itself.
            let succ = self.min(self.right(id));
            self.swap_payload(id, succ);
            id = succ;
        }

        // Now at most one child.
        let child = if self.left(id) != NIL {
            self.left(id)
        } else {
            self.right(id)
        };
        let parent = self.parent(id);
        let removed_color = self.color(id);

        // Transplant the child (possibly NIL) into the removed node's place.
        if parent == NIL {
            self.root = child;
        } else if self.left(parent) == id {
            self.node_mut(parent).left = child;
        } else {
            self.node_mut(parent).right = child;
        }
        if child != NIL {
            self.node_mut(child).parent = parent;
        }

        if removed_color == Color::Black {
            // Removing a black node shorts one path by a black; restore the count.
            self.remove_fixup(child, parent);
        }

        self.len -= 1;
        let node = self.dealloc(id);
        (node.key, node.value)
    }

    /// Swaps the key/value payloads of two distinct occupied slots, leaving links and colors in
    /// place.
    fn swap_payload(&mut self, a: NodeId, b: NodeId) {
        debug_assert_ne!(a, b);
        let (low, high) = if a < b { (a as usize, b as usize) } else { (b as usize, a as usize) };

        let (front, back) = self.slots.split_at_mut(high);
        // UNREACHABLE: Both ids reference occupied slots.
        let (x, y) = unsafe {
            (front[low].as_mut().unreachable(), back[0].as_mut().unreachable())
        };

        mem::swap(&mut x.key, &mut y.key);
        mem::swap(&mut x.value, &mut y.value);
    }

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);
        debug_assert_ne!(y, NIL);

        let y_left = self.left(y);
        self.node_mut(x).right = y_left;
        if y_left != NIL {
            self.node_mut(y_left).parent = x;
        }

        let x_parent = self.parent(x);
        self.node_mut(y).parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.left(x_parent) == x {
            self.node_mut(x_parent).left = y;
        } else {
            self.node_mut(x_parent).right = y;
        }

        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;
    }

    fn rotate_right(&mut self, x: NodeId) {
        let y = self.left(x);
        debug_assert_ne!(y, NIL);

        let y_right = self.right(y);
        self.node_mut(x).left = y_right;
        if y_right != NIL {
            self.node_mut(y_right).parent = x;
        }

        let x_parent = self.parent(x);
        self.node_mut(y).parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.left(x_parent) == x {
            self.node_mut(x_parent).left = y;
        } else {
            self.node_mut(x_parent).right = y;
        }

        self.node_mut(y).right = x;
        self.node_mut(x).parent = y;
    }

    /// Repairs a possible red-red violation walking up from a freshly inserted red node. The four
    /// cases (uncle red / uncle black, mirrored left and right) recolor or rotate; each loop
    /// iteration either terminates or moves the violation two levels up.
    fn insert_fixup(&mut self, mut x: NodeId) {
        while self.color(self.parent(x)) == Color::Red {
            let p = self.parent(x);
            // A red parent is never the root, so the grandparent exists.
            let g = self.parent(p);

            if p == self.left(g) {
                let uncle = self.right(g);
                if self.color(uncle) == Color::Red {
                    // Red uncle: push the blackness down from the grandparent and continue above.
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    x = g;
                } else {
                    if x == self.right(p) {
                        // Inner child: rotate into the outer position first.
                        x = p;
                        self.rotate_left(x);
                    }
                    let p = self.parent(x);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.left(g);
                if self.color(uncle) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    x = g;
                } else {
                    if x == self.left(p) {
                        x = p;
                        self.rotate_right(x);
                    }
                    let p = self.parent(x);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }

        self.set_color(self.root, Color::Black);
    }

    /// Dissolves the double-black produced by unlinking a black node. `x` is the transplanted
    /// child (possibly NIL, hence the explicit `parent`); the sibling cases mirror the classic
    /// formulation.
    fn remove_fixup(&mut self, mut x: NodeId, mut parent: NodeId) {
        while x != self.root && self.color(x) == Color::Black {
            if parent == NIL {
                break;
            }

            if x == self.left(parent) {
                let mut sibling = self.right(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.right(parent);
                }

                if self.color(self.left(sibling)) == Color::Black
                    && self.color(self.right(sibling)) == Color::Black
                {
                    // Both nephews black: recolor the sibling and float the deficit upward.
                    self.set_color(sibling, Color::Red);
                    x = parent;
                    parent = self.parent(x);
                } else {
                    if self.color(self.right(sibling)) == Color::Black {
                        self.set_color(self.left(sibling), Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.right(parent);
                    }
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(self.right(sibling), Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                    break;
                }
            } else {
                let mut sibling = self.left(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.left(parent);
                }

                if self.color(self.left(sibling)) == Color::Black
                    && self.color(self.right(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    x = parent;
                    parent = self.parent(x);
                } else {
                    if self.color(self.left(sibling)) == Color::Black {
                        self.set_color(self.right(sibling), Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.left(parent);
                    }
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(self.left(sibling), Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                    break;
                }
            }
        }

        self.set_color(x, Color::Black);
    }
}

#[cfg(test)]
impl<K: Ord, V> RbTree<K, V> {
    /// Validates the search-order and red-black invariants, returning the tree's black-height.
    /// Test-only; panics on any violation.
    pub fn check_invariants(&self) -> usize {
        if self.root == NIL {
            return 1;
        }
        assert_eq!(self.color(self.root), Color::Black, "Root must be black.");
        assert_eq!(self.parent(self.root), NIL, "Root must have no parent.");
        self.check_subtree(self.root)
    }

    fn check_subtree(&self, id: NodeId) -> usize {
        if id == NIL {
            return 1;
        }

        let node = self.node(id);
        if node.left != NIL {
            assert!(self.node(node.left).key < node.key, "Left child must compare less.");
            assert_eq!(self.parent(node.left), id, "Left child must link back to its parent.");
        }
        if node.right != NIL {
            assert!(self.node(node.right).key > node.key, "Right child must compare greater.");
            assert_eq!(self.parent(node.right), id, "Right child must link back to its parent.");
        }
        if node.color == Color::Red {
            assert_eq!(self.color(node.left), Color::Black, "Red nodes must have black children.");
            assert_eq!(self.color(node.right), Color::Black, "Red nodes must have black children.");
        }

        let left_height = self.check_subtree(node.left);
        let right_height = self.check_subtree(node.right);
        assert_eq!(
            left_height, right_height,
            "Black-height must be identical on every root-to-nil path."
        );

        left_height + if node.color == Color::Black { 1 } else { 0 }
    }
}
