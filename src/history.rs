//! Browser-style back/forward history of visited classes.
//!
//! History stores class ids, not positions: the visible list can be re-sorted, re-filtered or
//! shuffled between visits, so positions are resolved against the current list at the moment
//! of a back/forward step.

use serde::{Deserialize, Serialize};

use crate::class::ClassId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationHistory {
    entries: Vec<ClassId>,
    /// `None` is the empty history. When `Some`, always a valid index into `entries`.
    index: Option<usize>,
}

impl NavigationHistory {
    pub fn new() -> NavigationHistory {
        NavigationHistory::default()
    }

    /// Records a visit. Anything forward of the current pointer is discarded.
    pub fn commit(&mut self, id: ClassId) {
        let keep = self.index.map(|i| i + 1).unwrap_or(0);
        self.entries.truncate(keep);
        self.entries.push(id);
        self.index = Some(self.entries.len() - 1);
    }

    pub fn back(&mut self) -> Option<ClassId> {
        match self.index {
            Some(i) if i > 0 => {
                self.index = Some(i - 1);
                self.entries.get(i - 1).cloned()
            }
            _ => None,
        }
    }

    pub fn forward(&mut self) -> Option<ClassId> {
        match self.index {
            Some(i) if i + 1 < self.entries.len() => {
                self.index = Some(i + 1);
                self.entries.get(i + 1).cloned()
            }
            _ => None,
        }
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        matches!(self.index, Some(i) if i + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&ClassId> {
        self.index.and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[ClassId] {
        &self.entries
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }
}
