//! Tree builder turning flat category lists into a category forest.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::CategoryForest;
use crate::domain::entities::{Category, CategoryNode};

/// Constructs a [`CategoryForest`] from the flat, server-ordered category list.
///
/// Stateless: every call builds a fresh forest, so it is safe to call on every
/// refresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryTreeBuilder;

impl CategoryTreeBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the forest in two passes plus a cycle repair pass.
    ///
    /// - pass 1 stores every record and indexes it by id
    /// - pass 2 links each record under its parent, in input order; records
    ///   whose parent is missing (or is themselves) become roots
    /// - records left unreachable from any root sit on, or hang below, a
    ///   parent cycle; each cycle is cut at its member that comes first in
    ///   input order, which becomes a root. Branches below keep their parents
    #[instrument(level = "debug", skip_all, fields(count = categories.len()))]
    pub fn build(&self, categories: &[Category]) -> CategoryForest {
        let mut forest = CategoryForest::with_capacity(categories.len());

        for category in categories {
            forest.insert_detached(category.clone());
        }

        let order = forest.insertion_order().to_vec();
        for (category, &idx) in categories.iter().zip(order.iter()) {
            let parent = category
                .parent_id
                .and_then(|pid| forest.node_index(pid))
                .filter(|&pidx| pidx != idx);

            match parent {
                Some(pidx) => forest.attach(idx, pidx),
                None => {
                    if let Some(pid) = category.parent_id {
                        if pid != category.id {
                            debug!(id = category.id, parent = pid, "parent not found, promoting to root");
                        }
                    }
                    forest.push_root(idx);
                }
            }
        }

        if forest.reachable().len() < forest.len() {
            Self::break_cycles(&mut forest, &order);
        }

        forest
    }

    /// Build and materialize nested nodes in one step.
    pub fn build_nodes(&self, categories: &[Category]) -> Vec<CategoryNode> {
        self.build(categories).to_nodes()
    }

    fn break_cycles(forest: &mut CategoryForest, order: &[Index]) {
        let position: HashMap<Index, usize> =
            order.iter().enumerate().map(|(pos, &idx)| (idx, pos)).collect();
        let mut seen = forest.reachable();

        for &start in order {
            if seen.contains(&start) {
                continue;
            }
            let Some(cut) = Self::cycle_entry(forest, start, &seen, &position) else {
                continue;
            };
            if let Some(node) = forest.get_node(cut) {
                warn!(id = node.category.id, "category parent cycle, promoting to root");
            }
            forest.promote(cut);
            forest.mark_subtree(cut, &mut seen);
        }
    }

    /// Follow parent links up from `start` until a node repeats and return the
    /// cycle member that comes first in input order.
    fn cycle_entry(
        forest: &CategoryForest,
        start: Index,
        seen: &HashSet<Index>,
        position: &HashMap<Index, usize>,
    ) -> Option<Index> {
        let mut path: Vec<Index> = Vec::new();
        let mut on_path: HashMap<Index, usize> = HashMap::new();
        let mut current = Some(start);

        while let Some(idx) = current {
            if let Some(&first) = on_path.get(&idx) {
                return path[first..]
                    .iter()
                    .copied()
                    .min_by_key(|member| position.get(member).copied().unwrap_or(usize::MAX));
            }
            if seen.contains(&idx) {
                return None;
            }
            on_path.insert(idx, path.len());
            path.push(idx);
            current = forest.get_node(idx).and_then(|node| node.parent);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: i64, parent: Option<i64>) -> Category {
        Category::new(id, format!("category-{id}"), parent)
    }

    #[test]
    fn given_parent_listed_after_child_when_building_then_still_links() {
        let forest = CategoryTreeBuilder::new().build(&[cat(2, Some(1)), cat(1, None)]);
        assert_eq!(forest.root_ids(), vec![1]);
        assert_eq!(forest.child_ids(1), vec![2]);
    }

    #[test]
    fn given_self_reference_when_building_then_promotes_to_root() {
        let forest = CategoryTreeBuilder::new().build(&[cat(1, Some(1))]);
        assert_eq!(forest.root_ids(), vec![1]);
        assert!(forest.child_ids(1).is_empty());
    }

    #[test]
    fn given_two_node_cycle_when_building_then_breaks_at_first_member() {
        let forest =
            CategoryTreeBuilder::new().build(&[cat(10, None), cat(1, Some(2)), cat(2, Some(1))]);
        assert_eq!(forest.root_ids(), vec![10, 1]);
        assert_eq!(forest.child_ids(1), vec![2]);
        assert_eq!(forest.iter().count(), 3);
    }

    #[test]
    fn given_branch_below_cycle_when_building_then_branch_keeps_its_parent() {
        let forest =
            CategoryTreeBuilder::new().build(&[cat(3, Some(1)), cat(1, Some(2)), cat(2, Some(1))]);
        assert_eq!(forest.root_ids(), vec![1]);
        assert_eq!(forest.child_ids(1), vec![3, 2]);
        assert!(forest.child_ids(2).is_empty());
        assert_eq!(forest.parent(3).map(|c| c.id), Some(1));
    }

    #[test]
    fn given_long_tail_into_cycle_when_building_then_cuts_only_the_cycle() {
        // 5 -> 4 -> 3 -> (1 <-> 2), tail listed first
        let forest = CategoryTreeBuilder::new().build(&[
            cat(5, Some(4)),
            cat(4, Some(3)),
            cat(3, Some(2)),
            cat(2, Some(1)),
            cat(1, Some(2)),
        ]);
        assert_eq!(forest.root_ids(), vec![2]);
        assert_eq!(forest.child_ids(2), vec![3, 1]);
        assert_eq!(forest.child_ids(4), vec![5]);
        assert_eq!(forest.iter().count(), 5);
    }
}
