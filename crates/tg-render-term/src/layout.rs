//! Left-to-right rank layout.
//!
//! Ranks are longest-path distances over the relation graph once cycles are
//! broken. Cycle breaking drops the edges a depth-first search (in declaration
//! order) finds pointing back onto its own stack.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;
use tg_parser::DiagramDescription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

/// Rank and column placement for every node of a description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankLayout {
    /// Rank (column index) per node.
    pub ranks: Vec<usize>,
    /// Node indexes per column, in declaration order.
    pub columns: Vec<Vec<usize>>,
    /// Relation indexes dropped to break cycles.
    pub back_edges: FxHashSet<usize>,
}

impl RankLayout {
    #[must_use]
    pub fn rank_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of `node` within its column.
    #[must_use]
    pub fn slot(&self, node: usize) -> Option<usize> {
        let column = self.columns.get(*self.ranks.get(node)?)?;
        column.iter().position(|&candidate| candidate == node)
    }

    /// Largest number of nodes in any column.
    #[must_use]
    pub fn max_column_len(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Compute ranks for `description`.
#[must_use]
pub fn rank_layout(description: &DiagramDescription) -> RankLayout {
    let node_count = description.nodes.len();
    let mut outgoing: Vec<Vec<(usize, usize)>> = vec![Vec::new(); node_count];
    for (index, relation) in description.relations.iter().enumerate() {
        if !relation.is_self_relation() {
            outgoing[relation.from].push((index, relation.to));
        }
    }

    let back_edges = find_back_edges(&outgoing);

    let mut in_degree = vec![0_usize; node_count];
    let mut forward: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (node, edges) in outgoing.iter().enumerate() {
        for &(index, target) in edges {
            if back_edges.contains(&index) {
                continue;
            }
            forward[node].push(target);
            in_degree[target] += 1;
        }
    }

    let mut ranks = vec![0_usize; node_count];
    let mut ready: BinaryHeap<Reverse<usize>> = (0..node_count)
        .filter(|&node| in_degree[node] == 0)
        .map(Reverse)
        .collect();
    while let Some(Reverse(node)) = ready.pop() {
        for &target in &forward[node] {
            ranks[target] = ranks[target].max(ranks[node] + 1);
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                ready.push(Reverse(target));
            }
        }
    }

    let rank_count = ranks.iter().max().map_or(0, |max| max + 1);
    let mut columns = vec![Vec::new(); rank_count];
    for (node, &rank) in ranks.iter().enumerate() {
        columns[rank].push(node);
    }

    RankLayout {
        ranks,
        columns,
        back_edges,
    }
}

fn find_back_edges(outgoing: &[Vec<(usize, usize)>]) -> FxHashSet<usize> {
    let mut state = vec![VisitState::Unvisited; outgoing.len()];
    let mut back_edges = FxHashSet::default();

    for root in 0..outgoing.len() {
        if state[root] != VisitState::Unvisited {
            continue;
        }
        state[root] = VisitState::OnStack;
        let mut stack = vec![(root, 0_usize)];
        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&(relation, target)) = outgoing[node].get(frame.1) else {
                state[node] = VisitState::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;
            match state[target] {
                VisitState::Unvisited => {
                    state[target] = VisitState::OnStack;
                    stack.push((target, 0));
                }
                VisitState::OnStack => {
                    back_edges.insert(relation);
                }
                VisitState::Done => {}
            }
        }
    }

    back_edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_parser::parse_description;

    fn layout_of(body: &str) -> (DiagramDescription, RankLayout) {
        let description = parse_description(&format!("@startuml\n{body}\n@enduml")).unwrap();
        let layout = rank_layout(&description);
        (description, layout)
    }

    #[test]
    fn chain_gets_increasing_ranks() {
        let (_, layout) = layout_of("circle A\ncircle B\ncircle C\nA --> B\nB --> C");
        assert_eq!(layout.ranks, vec![0, 1, 2]);
        assert_eq!(layout.rank_count(), 3);
        assert!(layout.back_edges.is_empty());
    }

    #[test]
    fn longest_path_wins() {
        let (_, layout) =
            layout_of("circle A\ncircle B\ncircle C\nA --> C\nA --> B\nB --> C");
        assert_eq!(layout.ranks, vec![0, 1, 2]);
    }

    #[test]
    fn cycle_is_broken_at_the_closing_edge() {
        let (_, layout) = layout_of("circle A\ncircle B\ncircle C\nA --> B\nB --> C\nC --> A");
        assert_eq!(layout.ranks, vec![0, 1, 2]);
        assert_eq!(layout.back_edges.len(), 1);
        assert!(layout.back_edges.contains(&2));
    }

    #[test]
    fn self_relations_do_not_affect_ranks() {
        let (_, layout) = layout_of("circle N\nN --> N");
        assert_eq!(layout.ranks, vec![0]);
        assert!(layout.back_edges.is_empty());
    }

    #[test]
    fn columns_keep_declaration_order() {
        let (_, layout) = layout_of("circle Root\ncircle Y\ncircle X\nRoot --> X\nRoot --> Y");
        assert_eq!(layout.columns, vec![vec![0], vec![1, 2]]);
        assert_eq!(layout.slot(2), Some(1));
        assert_eq!(layout.max_column_len(), 2);
    }

    #[test]
    fn empty_description_has_no_columns() {
        let (_, layout) = layout_of("left to right direction");
        assert_eq!(layout.rank_count(), 0);
        assert_eq!(layout.max_column_len(), 0);
    }

    #[test]
    fn deep_chain_does_not_overflow_the_stack() {
        let mut body = String::new();
        for i in 0..5_000 {
            body.push_str(&format!("circle n{i}\n"));
        }
        for i in 1..5_000 {
            body.push_str(&format!("n{} --> n{i}\n", i - 1));
        }
        let (_, layout) = layout_of(&body);
        assert_eq!(layout.ranks[4_999], 4_999);
    }
}
