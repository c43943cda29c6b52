//! Lexicographic k-subsets of a candidate list.

use smallvec::SmallVec;
use crate::graph::SepSet;
use crate::model::VarId;

/// Iterator over all `k`-element subsets of `items`, in lexicographic
/// order of positions. `k = 0` yields the empty set once.
pub struct Combinations<'a> {
    items: &'a [VarId],
    indices: SmallVec<[usize; 4]>,
    started: bool,
    done: bool,
}

impl<'a> Combinations<'a> {
    pub fn new(items: &'a [VarId], k: usize) -> Self {
        Self {
            items,
            indices: (0..k).collect(),
            started: false,
            done: k > items.len(),
        }
    }

    fn current(&self) -> SepSet {
        self.indices.iter().map(|&i| self.items[i]).collect()
    }
}

impl Iterator for Combinations<'_> {
    type Item = SepSet;

    fn next(&mut self) -> Option<SepSet> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.current());
        }

        let (n, k) = (self.items.len(), self.indices.len());
        let Some(pos) = (0..k).rev().find(|&p| self.indices[p] < n - k + p) else {
            self.done = true;
            return None;
        };
        self.indices[pos] += 1;
        for p in pos + 1..k {
            self.indices[p] = self.indices[p - 1] + 1;
        }
        Some(self.current())
    }
}
