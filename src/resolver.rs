//! One-shot navigation requests resolved against the next recomputed visible list.
//!
//! Selecting a search suggestion clears the search term, which changes the membership and
//! order of the visible list. The target position is therefore only meaningful after the
//! pipeline has rerun, so the request is parked here and answered by the next recomputation
//! that produces a non-empty list.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    class::{ClassId, OntologyClass},
    query::index_of,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Resolved { id: ClassId, index: usize },
    Missed { id: ClassId },
}

/// Single-slot pending navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredNavigation {
    pending: Option<ClassId>,
}

impl DeferredNavigation {
    /// Parks a request, replacing any unresolved one.
    pub fn arm(&mut self, id: ClassId) {
        if let Some(previous) = self.pending.replace(id) {
            tracing::debug!("[DeferredNavigation] superseding unresolved request for {previous}");
        }
    }

    pub fn pending(&self) -> Option<&ClassId> {
        self.pending.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) -> Option<ClassId> {
        self.pending.take()
    }

    /// Called after every recomputation. An empty list leaves the request parked; otherwise
    /// the request is answered and cleared whether or not the class was found.
    pub fn on_recompute(&mut self, visible: &[Arc<OntologyClass>]) -> Option<Resolution> {
        if visible.is_empty() {
            return None;
        }
        let id = self.pending.take()?;
        match index_of(visible, &id) {
            Some(index) => Some(Resolution::Resolved { id, index }),
            None => Some(Resolution::Missed { id }),
        }
    }
}
