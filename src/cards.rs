//! Per-card interaction flags, keyed by class id rather than by position.

use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::class::ClassId;

/// Collapsible detail lists on the back of a card.
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[enumset(serialize_repr = "list")]
#[serde(rename_all = "lowercase")]
pub enum DetailSection {
    Superclasses,
    Subclasses,
    Properties,
    Instances,
}

impl DetailSection {
    pub fn parse(name: &str) -> Option<DetailSection> {
        match name.trim().to_ascii_lowercase().as_str() {
            "superclasses" => Some(DetailSection::Superclasses),
            "subclasses" => Some(DetailSection::Subclasses),
            "properties" => Some(DetailSection::Properties),
            "instances" => Some(DetailSection::Instances),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUiState {
    flipped: BTreeSet<ClassId>,
    expanded: BTreeMap<ClassId, EnumSet<DetailSection>>,
}

impl CardUiState {
    /// Returns the new flip state.
    pub fn toggle_flip(&mut self, id: &ClassId) -> bool {
        if self.flipped.remove(id) {
            false
        } else {
            self.flipped.insert(id.clone());
            true
        }
    }

    pub fn is_flipped(&self, id: &ClassId) -> bool {
        self.flipped.contains(id)
    }

    pub fn flipped(&self) -> &BTreeSet<ClassId> {
        &self.flipped
    }

    /// Returns whether the section is now expanded.
    pub fn toggle_section(&mut self, id: &ClassId, section: DetailSection) -> bool {
        let sections = self.expanded.entry(id.clone()).or_default();
        let expanded = if sections.contains(section) {
            sections.remove(section);
            false
        } else {
            sections.insert(section);
            true
        };
        if sections.is_empty() {
            self.expanded.remove(id);
        }
        expanded
    }

    pub fn is_expanded(&self, id: &ClassId, section: DetailSection) -> bool {
        self.expanded
            .get(id)
            .is_some_and(|sections| sections.contains(section))
    }

    pub fn expanded_sections(&self, id: &ClassId) -> EnumSet<DetailSection> {
        self.expanded.get(id).copied().unwrap_or_default()
    }

    /// Drops expansion state of cards that are no longer rendered.
    pub fn retain_mounted<'a, I>(&mut self, mounted: I)
    where
        I: IntoIterator<Item = &'a ClassId>,
    {
        let mounted: BTreeSet<&ClassId> = mounted.into_iter().collect();
        self.expanded.retain(|id, _| mounted.contains(id));
    }

    /// Drops flip state of classes that no longer exist after a reload.
    pub fn retain_existing<'a, I>(&mut self, existing: I)
    where
        I: IntoIterator<Item = &'a ClassId>,
    {
        let existing: BTreeSet<&ClassId> = existing.into_iter().collect();
        self.flipped.retain(|id| existing.contains(id));
        self.expanded.retain(|id, _| existing.contains(id));
    }

    pub fn clear(&mut self) {
        self.flipped.clear();
        self.expanded.clear();
    }
}
