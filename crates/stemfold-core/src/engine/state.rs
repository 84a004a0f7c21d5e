use crate::core::models::pairing::Pairing;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// A complete structure and its energy.
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub energy: f64,
    pub sequence: String,
    pub structure: String,
    pub pairing: Pairing,
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.energy.total_cmp(&other.energy) == Ordering::Equal
    }
}
impl Eq for Solution {}

// Higher energy orders greater, so a max-heap keeps the worst kept solution on top.
impl PartialOrd for Solution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Solution {
    fn cmp(&self, other: &Self) -> Ordering {
        self.energy.total_cmp(&other.energy)
    }
}

/// The `capacity` lowest-energy distinct `(sequence, structure)` entries seen
/// so far.
#[derive(Debug, Clone)]
pub struct SolutionSet {
    capacity: usize,
    heap: BinaryHeap<Solution>,
    seen: HashSet<(String, String)>,
}

impl SolutionSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
            seen: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offers a solution; returns whether it was kept.
    pub fn offer(&mut self, solution: Solution) -> bool {
        let key = (solution.sequence.clone(), solution.structure.clone());
        if self.capacity == 0 || self.seen.contains(&key) {
            return false;
        }
        if self.heap.len() == self.capacity {
            match self.heap.peek() {
                Some(worst) if solution.energy < worst.energy => {
                    if let Some(evicted) = self.heap.pop() {
                        self.seen.remove(&(evicted.sequence, evicted.structure));
                    }
                }
                _ => return false,
            }
        }
        self.seen.insert(key);
        self.heap.push(solution);
        true
    }

    pub fn best(&self) -> Option<&Solution> {
        self.heap.iter().min()
    }

    /// Solutions sorted by ascending energy.
    pub fn into_sorted_vec(self) -> Vec<Solution> {
        self.heap.into_sorted_vec()
    }
}
