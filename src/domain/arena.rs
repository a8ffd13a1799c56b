use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Category, CategoryId, CategoryNode};

/// Node of the category forest.
#[derive(Debug)]
pub struct ForestNode {
    pub category: Category,
    /// Index of parent node in the arena, None for roots
    pub parent: Option<Index>,
    /// Indices of child nodes, in input order
    pub children: Vec<Index>,
}

/// Arena-based category forest.
///
/// Nodes live in a generational arena; `index` maps category ids to arena
/// positions. Parent/child links are arena indices, so the flat lookup and the
/// tree never share node storage.
#[derive(Debug, Default)]
pub struct CategoryForest {
    arena: Arena<ForestNode>,
    index: HashMap<CategoryId, Index>,
    roots: Vec<Index>,
    /// Arena positions in input order
    order: Vec<Index>,
}

impl CategoryForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            roots: Vec::new(),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Store a detached node. A later node with the same id takes over the id lookup.
    pub(crate) fn insert_detached(&mut self, category: Category) -> Index {
        let id = category.id;
        let idx = self.arena.insert(ForestNode {
            category,
            parent: None,
            children: Vec::new(),
        });
        self.index.insert(id, idx);
        self.order.push(idx);
        idx
    }

    pub(crate) fn attach(&mut self, child: Index, parent: Index) {
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
    }

    pub(crate) fn push_root(&mut self, idx: Index) {
        self.roots.push(idx);
    }

    /// Cut `idx` from its parent and make it a root.
    pub(crate) fn promote(&mut self, idx: Index) {
        let parent = self.arena.get_mut(idx).and_then(|node| node.parent.take());
        if let Some(parent) = parent.and_then(|p| self.arena.get_mut(p)) {
            parent.children.retain(|&c| c != idx);
        }
        self.roots.push(idx);
    }

    pub(crate) fn insertion_order(&self) -> &[Index] {
        &self.order
    }

    /// Arena position currently registered for `id`.
    pub fn node_index(&self, id: CategoryId) -> Option<Index> {
        self.index.get(&id).copied()
    }

    pub fn get_node(&self, idx: Index) -> Option<&ForestNode> {
        self.arena.get(idx)
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.node_index(id)
            .and_then(|idx| self.get_node(idx))
            .map(|node| &node.category)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn root_indices(&self) -> &[Index] {
        &self.roots
    }

    pub fn roots(&self) -> Vec<&Category> {
        self.categories_at(&self.roots)
    }

    pub fn root_ids(&self) -> Vec<CategoryId> {
        self.roots().into_iter().map(|c| c.id).collect()
    }

    /// Direct children of `id`; empty if unknown or a leaf.
    pub fn children(&self, id: CategoryId) -> Vec<&Category> {
        match self.node_index(id).and_then(|idx| self.get_node(idx)) {
            Some(node) => self.categories_at(&node.children),
            None => Vec::new(),
        }
    }

    pub fn child_ids(&self, id: CategoryId) -> Vec<CategoryId> {
        self.children(id).into_iter().map(|c| c.id).collect()
    }

    pub fn parent(&self, id: CategoryId) -> Option<&Category> {
        let node = self.node_index(id).and_then(|idx| self.get_node(idx))?;
        node.parent
            .and_then(|p| self.get_node(p))
            .map(|parent| &parent.category)
    }

    /// Path from the root down to `id` (inclusive). Empty if `id` is unknown.
    #[instrument(level = "trace", skip(self))]
    pub fn ancestors(&self, id: CategoryId) -> Vec<&Category> {
        let mut path = Vec::new();
        let mut current = self.node_index(id);
        // parent links are acyclic after building; the bound is a backstop
        while let Some(idx) = current {
            if path.len() > self.len() {
                break;
            }
            let Some(node) = self.get_node(idx) else {
                break;
            };
            path.push(&node.category);
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Number of levels in the deepest tree, 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth + 1).max().unwrap_or(0)
    }

    /// Categories without subcategories, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaves(&self) -> Vec<&Category> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| &node.category)
            .collect()
    }

    /// First category in pre-order whose display name equals `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        self.find(|c| c.name == name)
    }

    /// First category in pre-order whose English name matches `name_en`, ignoring case.
    pub fn find_by_name_en(&self, name_en: &str) -> Option<&Category> {
        self.find(|c| !c.name_en.is_empty() && c.name_en.eq_ignore_ascii_case(name_en))
    }

    pub fn find<P>(&self, mut predicate: P) -> Option<&Category>
    where
        P: FnMut(&Category) -> bool,
    {
        self.iter()
            .map(|(_, node)| &node.category)
            .find(|c| predicate(c))
    }

    /// Depth-first pre-order traversal over all trees, yielding `(depth, node)`.
    pub fn iter(&self) -> ForestIterator {
        ForestIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    /// Materialize owned nested nodes, roots in order.
    #[instrument(level = "debug", skip(self))]
    pub fn to_nodes(&self) -> Vec<CategoryNode> {
        let mut built: HashMap<Index, CategoryNode> = HashMap::with_capacity(self.len());
        for (idx, node) in self.iter_postorder() {
            let children = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(
                idx,
                CategoryNode {
                    category: node.category.clone(),
                    children,
                },
            );
        }
        self.roots
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }

    /// Arena positions reachable from the roots.
    pub(crate) fn reachable(&self) -> HashSet<Index> {
        self.iter_postorder().map(|(idx, _)| idx).collect()
    }

    /// Add `idx` and everything below it to `seen`.
    pub(crate) fn mark_subtree(&self, idx: Index, seen: &mut HashSet<Index>) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.get_node(current) {
                stack.extend(node.children.iter().copied());
            }
        }
    }

    fn categories_at(&self, indices: &[Index]) -> Vec<&Category> {
        indices
            .iter()
            .filter_map(|&idx| self.get_node(idx))
            .map(|node| &node.category)
            .collect()
    }
}

pub struct ForestIterator<'a> {
    forest: &'a CategoryForest,
    stack: Vec<(usize, Index)>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a CategoryForest) -> Self {
        // Reverse so the first root is popped first
        let stack = forest.roots.iter().rev().map(|&idx| (0, idx)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (usize, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, current_idx)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((depth + 1, child));
                }
                return Some((depth, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    forest: &'a CategoryForest,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(forest: &'a CategoryForest) -> Self {
        let stack = forest.roots.iter().rev().map(|&idx| (idx, false)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
