//! The view pipeline: raw classes in, the ordered visible list out.
//!
//! Everything here is a pure function of its inputs. Shuffling takes the random source as a
//! parameter so callers (and tests) decide where randomness comes from.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
    sync::Arc,
};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{
    class::{Category, CategorySet, ClassId, OntologyClass},
    error::DeckError,
};

/// Maximum number of search suggestions offered while typing.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 8;

/// Sentinel used by filter inputs for "no restriction".
pub const ALL_SENTINEL: &str = "all";

/// A single-valued filter facet: either everything passes or only one value does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet<T> {
    All,
    Only(T),
}

impl<T> Default for Facet<T> {
    fn default() -> Self {
        Facet::All
    }
}

impl<T: PartialEq> Facet<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Facet::All => true,
            Facet::Only(only) => only == value,
        }
    }
}

impl Facet<Category> {
    /// Parses filter input, where `"all"` lifts the restriction.
    pub fn category(input: &str) -> Facet<Category> {
        if input.trim().eq_ignore_ascii_case(ALL_SENTINEL) || input.trim().is_empty() {
            Facet::All
        } else {
            Facet::Only(Category::parse(input))
        }
    }
}

impl Facet<String> {
    pub fn root(input: &str) -> Facet<String> {
        if input.trim().eq_ignore_ascii_case(ALL_SENTINEL) || input.trim().is_empty() {
            Facet::All
        } else {
            Facet::Only(input.to_string())
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Subclasses,
    Properties,
    Instances,
    Depth,
}

impl SortKey {
    pub fn all() -> &'static [SortKey] {
        &[
            SortKey::Name,
            SortKey::Subclasses,
            SortKey::Properties,
            SortKey::Instances,
            SortKey::Depth,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Subclasses => "subclasses",
            SortKey::Properties => "properties",
            SortKey::Instances => "instances",
            SortKey::Depth => "depth",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::all()
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DeckError::NotFound(format!("unknown sort key '{s}'")))
    }
}

/// All inputs of the view pipeline besides the raw classes and the random source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: Facet<Category>,
    #[serde(default)]
    pub root: Facet<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub shuffle: bool,
}

impl ViewQuery {
    pub fn matches(&self, class: &OntologyClass) -> bool {
        matches_search(class, &self.search)
            && self.category.admits(&class.effective_category())
            && match &self.root {
                Facet::All => true,
                Facet::Only(root) => class.root() == Some(root.as_str()),
            }
    }
}

fn matches_search(class: &OntologyClass, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    class.label.to_lowercase().contains(&term)
        || class
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&term))
}

/// Collation key approximating a locale-aware comparison: compatibility-decomposed, accents
/// stripped and case-folded.
pub fn collation_key(label: &str) -> String {
    label
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Tiebreak for labels with equal collation keys: lowercase sorts before uppercase.
fn case_tiebreak_key(label: &str) -> String {
    label
        .chars()
        .flat_map(|c| {
            let swapped: Vec<char> = if c.is_lowercase() {
                c.to_uppercase().collect()
            } else {
                c.to_lowercase().collect()
            };
            swapped
        })
        .collect()
}

pub fn compare_labels(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| case_tiebreak_key(a).cmp(&case_tiebreak_key(b)))
}

/// Filters, sorts and (optionally) shuffles `raw` into the visible list.
pub fn compute_visible<R: Rng + ?Sized>(
    raw: &[Arc<OntologyClass>],
    query: &ViewQuery,
    rng: &mut R,
) -> Vec<Arc<OntologyClass>> {
    let mut visible: Vec<Arc<OntologyClass>> = raw
        .iter()
        .filter(|c| query.matches(c))
        .cloned()
        .collect();

    match query.sort {
        SortKey::Name => {
            visible.sort_by_cached_key(|c| (collation_key(&c.label), case_tiebreak_key(&c.label)));
        }
        SortKey::Subclasses => {
            visible.sort_by(|a, b| b.stats.subclasses_count.cmp(&a.stats.subclasses_count))
        }
        SortKey::Properties => {
            visible.sort_by(|a, b| b.stats.properties_count.cmp(&a.stats.properties_count))
        }
        SortKey::Instances => {
            visible.sort_by(|a, b| b.stats.instances_count.cmp(&a.stats.instances_count))
        }
        SortKey::Depth => {
            visible.sort_by(|a, b| b.stats.hierarchy_depth.cmp(&a.stats.hierarchy_depth))
        }
    }

    if query.shuffle {
        visible.shuffle(rng);
    }

    tracing::debug!(
        "[compute_visible] {} of {} classes visible (search: {:?}, sort: {}, shuffle: {})",
        visible.len(),
        raw.len(),
        query.search,
        query.sort,
        query.shuffle
    );
    visible
}

pub fn index_of(visible: &[Arc<OntologyClass>], id: &ClassId) -> Option<usize> {
    visible.iter().position(|c| &c.id == id)
}

/// Locates a class by a name appearing in a hierarchy list. Exact matches on label, id or
/// local name win over case-insensitive matches on label or local name.
pub fn find_by_name(visible: &[Arc<OntologyClass>], name: &str) -> Option<usize> {
    visible
        .iter()
        .position(|c| c.answers_to(name))
        .or_else(|| visible.iter().position(|c| c.answers_to_ignore_case(name)))
}

/// Type-ahead suggestions over the unfiltered classes, in source order.
pub fn suggestions(
    raw: &[Arc<OntologyClass>],
    term: &str,
    limit: usize,
) -> Vec<Arc<OntologyClass>> {
    if term.is_empty() {
        return Vec::new();
    }
    let term = term.to_lowercase();
    raw.iter()
        .filter(|c| {
            c.label.to_lowercase().contains(&term)
                || c.local_name.to_lowercase().contains(&term)
                || c.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&term))
        })
        .take(limit)
        .cloned()
        .collect()
}

/// Distinct effective categories, ordered by name.
pub fn categories(raw: &[Arc<OntologyClass>]) -> Vec<Category> {
    let present: CategorySet = raw.iter().map(|c| c.effective_category()).collect();
    let mut cats: Vec<Category> = present.iter().collect();
    cats.sort_by_key(|c| c.as_str());
    cats
}

/// Distinct non-empty root classes, ordered.
pub fn root_classes(raw: &[Arc<OntologyClass>]) -> Vec<String> {
    raw.iter()
        .filter_map(|c| c.root())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn category_counts(visible: &[Arc<OntologyClass>]) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for class in visible {
        *counts.entry(class.effective_category()).or_insert(0) += 1;
    }
    counts
}

pub fn classes_in_category(
    visible: &[Arc<OntologyClass>],
    category: Category,
) -> Vec<Arc<OntologyClass>> {
    visible
        .iter()
        .filter(|c| c.effective_category() == category)
        .cloned()
        .collect()
}

/// Aggregate counters over the visible list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total: usize,
    pub avg_subclasses: f64,
    pub avg_properties: f64,
    pub avg_instances: f64,
    pub max_depth: usize,
}

impl DeckStats {
    pub fn compute(visible: &[Arc<OntologyClass>]) -> Option<DeckStats> {
        if visible.is_empty() {
            return None;
        }
        let total = visible.len();
        let sum = |f: fn(&OntologyClass) -> usize| -> f64 {
            visible.iter().map(|c| f(c)).sum::<usize>() as f64
        };
        Some(DeckStats {
            total,
            avg_subclasses: sum(|c| c.stats.subclasses_count) / total as f64,
            avg_properties: sum(|c| c.stats.properties_count) / total as f64,
            avg_instances: sum(|c| c.stats.instances_count) / total as f64,
            max_depth: visible
                .iter()
                .map(|c| c.stats.hierarchy_depth)
                .max()
                .unwrap_or_default(),
        })
    }
}

impl fmt::Display for DeckStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} classes, avg {:.1} subclasses, {:.1} properties, {:.1} instances, max depth {}",
            self.total, self.avg_subclasses, self.avg_properties, self.avg_instances, self.max_depth
        )
    }
}
