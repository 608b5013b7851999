use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::collections::VecDeque;
use std::fmt;
use std::mem;

use log::{debug, trace};

use crate::error::{Error, Result};

/// An ordered set of keys stored in an AVL tree.
///
/// Every node is owned by its parent. Mutations take a subtree by value
/// and hand back its new root, so rotations never alias a node.
///
/// ```
/// use avl_balanced::AvlTree;
/// let mut tree = AvlTree::new();
/// for key in 0..10 {
///     tree.insert(key);
/// }
/// assert_eq!(tree.height(), 4);
/// assert_eq!(tree.search_iterative(&7), Some(&7));
/// assert!(tree.remove(&7));
/// assert!(tree.search_recursive(&7).is_none());
/// ```
#[derive(Clone)]
pub struct AvlTree<K> {
    root: Link<K>,
    num_nodes: usize,
}

type Link<K> = Option<Box<Node<K>>>;

#[derive(Clone)]
struct Node<K> {
    key: K,
    left: Link<K>,
    right: Link<K>,
    height: usize,
}

impl<K> AvlTree<K> {
    /// Creates an empty tree.
    /// No memory is allocated until the first key is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
        }
    }

    /// Returns true if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of keys in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the tree: 0 when empty, 1 for a single key.
    pub fn height(&self) -> usize {
        Node::height_of(&self.root)
    }

    /// Releases every node, children before their parent.
    /// Calling it on an empty tree does nothing.
    #[doc(alias = "destroy")]
    pub fn clear(&mut self) {
        if self.root.is_some() {
            debug!("releasing {} nodes", self.num_nodes);
        }
        Node::destroy(self.root.take());
        self.num_nodes = 0;
    }

    /// Visits all keys in pre-order (node, left, right).
    pub fn preorder<F: FnMut(&K)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }

    /// Visits all keys in in-order, that is in ascending order.
    pub fn inorder<F: FnMut(&K)>(&self, f: F) {
        self.traverse(|_| {}, f, |_| {});
    }

    /// Visits all keys in post-order (left, right, node).
    pub fn postorder<F: FnMut(&K)>(&self, f: F) {
        self.traverse(|_| {}, |_| {}, f);
    }

    /// Walks the tree depth first, calling `preorder` when a node is entered,
    /// `inorder` after its left subtree and `postorder` after its right subtree.
    pub fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(&K),
        In: FnMut(&K),
        Post: FnMut(&K),
    {
        if let Some(root) = self.root.as_deref() {
            root.walk(&mut preorder, &mut inorder, &mut postorder);
        }
    }

    /// Visits all keys level by level, starting at the root.
    pub fn level_order<F: FnMut(&K)>(&self, mut f: F) {
        let mut queue: VecDeque<&Node<K>> = self.root.as_deref().into_iter().collect();
        while let Some(node) = queue.pop_front() {
            f(&node.key);
            queue.extend(node.left.as_deref());
            queue.extend(node.right.as_deref());
        }
    }
}

impl<K: Ord> AvlTree<K> {
    /// Inserts a key into the tree.
    /// Returns false, leaving the tree untouched, if the key was already present.
    pub fn insert(&mut self, key: K) -> bool {
        let (root, inserted) = Node::insert(self.root.take(), key);
        self.root = Some(root);
        if inserted {
            self.num_nodes += 1;
        }
        inserted
    }

    /// Removes a key from the tree.
    /// Returns whether the key was previously in the tree.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes a key from the tree and returns it, if it was present.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (root, removed) = Node::remove(self.root.take(), key);
        self.root = root;
        if removed.is_some() {
            debug_assert!(self.num_nodes >= 1);
            self.num_nodes -= 1;
        }
        removed
    }

    /// Looks a key up by recursive descent.
    pub fn search_recursive<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Node::search(&self.root, key)
    }

    /// Looks a key up with a loop. Compares exactly like [`search_recursive`].
    ///
    /// [`search_recursive`]: AvlTree::search_recursive
    pub fn search_iterative<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(node.key.borrow()) {
                Ordering::Equal => return Some(&node.key),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }

    /// Returns true if the tree contains the key.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search_iterative(key).is_some()
    }

    /// Returns the smallest key, or [`Error::EmptyTree`].
    pub fn find_min(&self) -> Result<&K> {
        let mut node = self.root.as_deref().ok_or(Error::EmptyTree)?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Ok(&node.key)
    }

    /// Returns the largest key, or [`Error::EmptyTree`].
    pub fn find_max(&self) -> Result<&K> {
        let mut node = self.root.as_deref().ok_or(Error::EmptyTree)?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Ok(&node.key)
    }

    /// Panics unless keys are strictly ordered, cached heights are exact,
    /// every node is balanced and the node count matches.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        let mut num_nodes = 0;
        if let Some(root) = self.root.as_deref() {
            root.check(None, None, &mut num_nodes);
        }
        assert_eq!(num_nodes, self.num_nodes);
        assert_eq!(self.is_empty(), self.num_nodes == 0);
    }
}

impl<K> Drop for AvlTree<K> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K> Default for AvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for AvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        self.inorder(|key| {
            set.entry(key);
        });
        set.finish()
    }
}

impl<K: Ord> FromIterator<K> for AvlTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord> Extend<K> for AvlTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K> Node<K> {
    fn create(key: K) -> Box<Self> {
        Box::new(Node {
            key,
            left: None,
            right: None,
            height: 1,
        })
    }

    // Children are released before the node itself.
    fn destroy(link: Link<K>) {
        if let Some(mut node) = link {
            Self::destroy(node.left.take());
            Self::destroy(node.right.take());
        }
    }

    fn height_of(link: &Link<K>) -> usize {
        link.as_ref().map_or(0, |node| node.height)
    }

    fn left_height(&self) -> usize {
        Self::height_of(&self.left)
    }

    fn right_height(&self) -> usize {
        Self::height_of(&self.right)
    }

    fn adjust_height(&mut self) {
        self.height = 1 + cmp::max(self.left_height(), self.right_height());
    }

    fn walk<Pre, In, Post>(&self, preorder: &mut Pre, inorder: &mut In, postorder: &mut Post)
    where
        Pre: FnMut(&K),
        In: FnMut(&K),
        Post: FnMut(&K),
    {
        preorder(&self.key);
        if let Some(left) = self.left.as_deref() {
            left.walk(preorder, inorder, postorder);
        }
        inorder(&self.key);
        if let Some(right) = self.right.as_deref() {
            right.walk(preorder, inorder, postorder);
        }
        postorder(&self.key);
    }

    /// Left child becomes the subtree root; its right subtree moves under the old root.
    fn rotate_right(mut node: Box<Self>) -> Box<Self> {
        let mut left = match node.left.take() {
            Some(left) => left,
            None => return node,
        };
        node.left = left.right.take();
        node.adjust_height();
        left.right = Some(node);
        left.adjust_height();
        trace!("rotated right, subtree height now {}", left.height);
        left
    }

    /// Right child becomes the subtree root; its left subtree moves under the old root.
    fn rotate_left(mut node: Box<Self>) -> Box<Self> {
        let mut right = match node.right.take() {
            Some(right) => right,
            None => return node,
        };
        node.right = right.left.take();
        node.adjust_height();
        right.left = Some(node);
        right.adjust_height();
        trace!("rotated left, subtree height now {}", right.height);
        right
    }

    fn rotate_left_right(mut node: Box<Self>) -> Box<Self> {
        if let Some(left) = node.left.take() {
            node.left = Some(Self::rotate_left(left));
        }
        Self::rotate_right(node)
    }

    fn rotate_right_left(mut node: Box<Self>) -> Box<Self> {
        if let Some(right) = node.right.take() {
            node.right = Some(Self::rotate_right(right));
        }
        Self::rotate_left(node)
    }

    /// Restores the AVL condition at `node` and adjusts its height.
    /// Children must already be balanced with exact heights, and the
    /// height difference between them must not exceed 2, which holds
    /// after a single insert or remove below this node.
    /// Returns the new subtree root.
    fn rebalance(mut node: Box<Self>) -> Box<Self> {
        let left_height = node.left_height();
        let right_height = node.right_height();
        debug_assert!(left_height <= right_height + 2);
        debug_assert!(right_height <= left_height + 2);
        if left_height > right_height + 1 {
            // Left heavy. A taller inner grandchild needs the double rotation.
            let inner_taller = node
                .left
                .as_ref()
                .is_some_and(|left| left.right_height() > left.left_height());
            if inner_taller {
                Self::rotate_left_right(node)
            } else {
                Self::rotate_right(node)
            }
        } else if right_height > left_height + 1 {
            // Right heavy
            let inner_taller = node
                .right
                .as_ref()
                .is_some_and(|right| right.left_height() > right.right_height());
            if inner_taller {
                Self::rotate_right_left(node)
            } else {
                Self::rotate_left(node)
            }
        } else {
            node.adjust_height();
            node
        }
    }
}

impl<K: Ord> Node<K> {
    fn search<'a, Q>(link: &'a Link<K>, key: &Q) -> Option<&'a K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = link.as_deref()?;
        match key.cmp(node.key.borrow()) {
            Ordering::Equal => Some(&node.key),
            Ordering::Less => Self::search(&node.left, key),
            Ordering::Greater => Self::search(&node.right, key),
        }
    }

    /// Inserts `key` below `link` and returns the new subtree root,
    /// together with whether a node was added.
    fn insert(link: Link<K>, key: K) -> (Box<Self>, bool) {
        let mut node = match link {
            None => return (Self::create(key), true),
            Some(node) => node,
        };
        let inserted = match key.cmp(&node.key) {
            Ordering::Equal => false,
            Ordering::Less => {
                let (left, inserted) = Self::insert(node.left.take(), key);
                node.left = Some(left);
                inserted
            }
            Ordering::Greater => {
                let (right, inserted) = Self::insert(node.right.take(), key);
                node.right = Some(right);
                inserted
            }
        };
        if !inserted {
            return (node, false);
        }
        (Self::rebalance(node), true)
    }

    /// Removes `key` below `link` and returns the new subtree root,
    /// together with the removed key.
    fn remove<Q>(link: Link<K>, key: &Q) -> (Link<K>, Option<K>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = match link {
            None => return (None, None),
            Some(node) => node,
        };
        let removed = match key.cmp(node.key.borrow()) {
            Ordering::Equal => return Self::unlink(node),
            Ordering::Less => {
                let (left, removed) = Self::remove(node.left.take(), key);
                node.left = left;
                removed
            }
            Ordering::Greater => {
                let (right, removed) = Self::remove(node.right.take(), key);
                node.right = right;
                removed
            }
        };
        if removed.is_none() {
            return (Some(node), None);
        }
        (Some(Self::rebalance(node)), removed)
    }

    /// Takes `node` out of its subtree, returning the replacement subtree and the node's key.
    fn unlink(mut node: Box<Self>) -> (Link<K>, Option<K>) {
        match (node.left.take(), node.right.take()) {
            (Some(left), Some(right)) => {
                // The taller side donates its closest key, ties go to the right.
                let replacement = if left.height > right.height {
                    let (left, max) = Self::remove_max(left);
                    node.left = left;
                    node.right = Some(right);
                    max
                } else {
                    let (right, min) = Self::remove_min(right);
                    node.left = Some(left);
                    node.right = right;
                    min
                };
                let key = mem::replace(&mut node.key, replacement);
                (Some(Self::rebalance(node)), Some(key))
            }
            (child, None) | (None, child) => {
                let Node { key, .. } = *node;
                (child, Some(key))
            }
        }
    }

    fn remove_min(mut node: Box<Self>) -> (Link<K>, K) {
        match node.left.take() {
            None => {
                let Node { key, right, .. } = *node;
                (right, key)
            }
            Some(left) => {
                let (left, min) = Self::remove_min(left);
                node.left = left;
                (Some(Self::rebalance(node)), min)
            }
        }
    }

    fn remove_max(mut node: Box<Self>) -> (Link<K>, K) {
        match node.right.take() {
            None => {
                let Node { key, left, .. } = *node;
                (left, key)
            }
            Some(right) => {
                let (right, max) = Self::remove_max(right);
                node.right = right;
                (Some(Self::rebalance(node)), max)
            }
        }
    }

    // Returns the checked height of the subtree rooted at this node.
    #[cfg(any(test, feature = "consistency_check"))]
    fn check(&self, lower: Option<&K>, upper: Option<&K>, num_nodes: &mut usize) -> usize {
        if let Some(lower) = lower {
            assert!(*lower < self.key);
        }
        if let Some(upper) = upper {
            assert!(self.key < *upper);
        }

        let mut left_height = 0;
        if let Some(left) = self.left.as_deref() {
            left_height = left.check(lower, Some(&self.key), num_nodes);
        }
        let mut right_height = 0;
        if let Some(right) = self.right.as_deref() {
            right_height = right.check(Some(&self.key), upper, num_nodes);
        }

        // Check height
        assert_eq!(self.height, 1 + cmp::max(left_height, right_height));

        // Check AVL condition (nearly balance)
        assert!(left_height <= right_height + 1);
        assert!(right_height <= left_height + 1);

        *num_nodes += 1;
        self.height
    }
}
