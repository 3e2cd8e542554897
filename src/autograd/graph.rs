//! Graph traversal driving the backward pass

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::variable::{Variable, VariableId};
use crate::tensor::Element;

/// Orders the ancestors of a variable for gradient replay
pub struct Executor;

impl Executor {
    /// Every node reachable from `root` through inputs that require
    /// gradients, `root` included, in breadth-first order
    pub fn collect_ancestors<T: Element>(root: &Variable<T>) -> Vec<Variable<T>> {
        let mut seen: BTreeSet<VariableId> = BTreeSet::new();
        let mut queue = VecDeque::from([root.clone()]);
        let mut nodes = Vec::new();
        seen.insert(root.id());

        while let Some(node) = queue.pop_front() {
            for input in node.inputs() {
                if input.requires_grad() && seen.insert(input.id()) {
                    queue.push_back(input);
                }
            }
            nodes.push(node);
        }

        nodes
    }

    /// Ancestors of `root` ordered so every node comes after all of its
    /// inputs: leaves first, `root` last. Backward consumes it in reverse.
    pub fn topological_sort<T: Element>(root: &Variable<T>) -> Vec<Variable<T>> {
        let nodes: BTreeMap<VariableId, Variable<T>> = Self::collect_ancestors(root)
            .into_iter()
            .map(|v| (v.id(), v))
            .collect();

        let tracked_inputs = |node: &Variable<T>| -> Vec<Variable<T>> {
            node.inputs()
                .into_iter()
                .filter(|input| nodes.contains_key(&input.id()))
                .collect()
        };

        let mut in_degree: BTreeMap<VariableId, usize> = nodes.keys().map(|&id| (id, 0)).collect();
        for node in nodes.values() {
            for input in tracked_inputs(node) {
                *in_degree.entry(input.id()).or_insert(0) += 1;
            }
        }

        let mut ready: VecDeque<Variable<T>> = nodes
            .iter()
            .filter(|(id, _)| in_degree.get(*id) == Some(&0))
            .map(|(_, node)| node.clone())
            .collect();

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(node) = ready.pop_front() {
            for input in tracked_inputs(&node) {
                if let Some(degree) = in_degree.get_mut(&input.id()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(input);
                    }
                }
            }
            order.push(node);
        }

        order.reverse();
        order
    }
}
