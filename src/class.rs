//! Ontology class records as delivered by a [crate::source::ClassSource].
//!
//! A fetch produces a fresh `Vec<OntologyClass>`; the repository wraps each entry in an
//! [std::sync::Arc] and every other component only holds references. Edits never touch these
//! records in place, they go through the source and come back as a full reload.

use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use crate::error::DeckError;

/// Identifier of an ontology class, stable across reloads of the same source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(String);

impl ClassId {
    pub fn new<S: Into<String>>(id: S) -> ClassId {
        ClassId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ClassId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClassId {
    fn from(id: &str) -> ClassId {
        ClassId(id.to_string())
    }
}

impl From<String> for ClassId {
    fn from(id: String) -> ClassId {
        ClassId(id)
    }
}

impl Borrow<str> for ClassId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Display grouping of a class. Unknown category names deserialize to [Category::Default] so a
/// source adding a new category degrades to the neutral color rather than failing the load.
#[derive(Debug, Default, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Symptom,
    Role,
    Event,
    Organization,
    Record,
    Device,
    Concept,
    Property,
    #[default]
    #[serde(other)]
    Default,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Symptom,
            Category::Role,
            Category::Event,
            Category::Organization,
            Category::Record,
            Category::Device,
            Category::Concept,
            Category::Property,
            Category::Default,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Symptom => "symptom",
            Category::Role => "role",
            Category::Event => "event",
            Category::Organization => "organization",
            Category::Record => "record",
            Category::Device => "device",
            Category::Concept => "concept",
            Category::Property => "property",
            Category::Default => "default",
        }
    }

    /// Accent color used for the card header and hierarchy chips.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Symptom => "#ef4444",
            Category::Role => "#3b82f6",
            Category::Event => "#8b5cf6",
            Category::Organization => "#10b981",
            Category::Record => "#f59e0b",
            Category::Device => "#06b6d4",
            Category::Concept => "#1e293b",
            Category::Property => "#10b981",
            Category::Default => "#6b7280",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Symptom => "🩺",
            Category::Role => "👤",
            Category::Event => "📅",
            Category::Organization => "🏥",
            Category::Record => "📄",
            Category::Device => "📱",
            Category::Concept => "💡",
            Category::Property => "🔗",
            Category::Default => "📦",
        }
    }

    /// Lenient parse used for filter input. Unknown names fall back to [Category::Default].
    pub fn parse(name: &str) -> Category {
        let name = name.trim();
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type CategorySet = EnumSet<Category>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStats {
    #[serde(default)]
    pub subclasses_count: usize,
    #[serde(default)]
    pub properties_count: usize,
    #[serde(default)]
    pub instances_count: usize,
    #[serde(default)]
    pub hierarchy_depth: usize,
    #[serde(default)]
    pub superclasses_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_descendants: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyClass {
    pub id: ClassId,
    pub label: String,
    #[serde(default)]
    pub local_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub superclasses_list: Vec<String>,
    #[serde(default)]
    pub subclasses_list: Vec<String>,
    #[serde(default)]
    pub properties_list: Vec<String>,
    #[serde(default)]
    pub instances_list: Vec<String>,
    #[serde(default)]
    pub stats: ClassStats,
}

impl OntologyClass {
    /// The category used for filtering and display. Absent categories count as
    /// [Category::Default].
    pub fn effective_category(&self) -> Category {
        self.category.unwrap_or_default()
    }

    /// `root_class` with empty strings treated as absent.
    pub fn root(&self) -> Option<&str> {
        self.root_class.as_deref().filter(|r| !r.is_empty())
    }

    /// True if `name` refers to this class by label, local name or id.
    pub fn answers_to(&self, name: &str) -> bool {
        self.label == name || self.id.as_str() == name || self.local_name == name
    }

    /// Case-insensitive variant of [OntologyClass::answers_to], limited to label and local name.
    pub fn answers_to_ignore_case(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.label.to_lowercase() == name
            || (!self.local_name.is_empty() && self.local_name.to_lowercase() == name)
    }

    /// Checks the declared counters against the related-name lists.
    pub fn validate(&self) -> Result<(), DeckError> {
        let mut issues = Vec::new();
        if self.id.is_empty() {
            issues.push("empty id".to_string());
        }
        let checks = [
            ("subclasses", self.stats.subclasses_count, &self.subclasses_list),
            ("properties", self.stats.properties_count, &self.properties_list),
            ("instances", self.stats.instances_count, &self.instances_list),
            (
                "superclasses",
                self.stats.superclasses_count,
                &self.superclasses_list,
            ),
        ];
        for (name, count, list) in checks {
            if !list.is_empty() && count != list.len() {
                issues.push(format!(
                    "{name}_count is {count} but {name}_list has {} entries",
                    list.len()
                ));
            }
        }
        // The subclass counter is checked even when the list is empty: a source that
        // reports children must also ship their names.
        if self.subclasses_list.is_empty() && self.stats.subclasses_count != 0 {
            issues.push(format!(
                "subclasses_count is {} but subclasses_list is empty",
                self.stats.subclasses_count
            ));
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(DeckError::Integrity(format!(
                "class '{}' ({}): {}",
                self.label,
                self.id,
                issues.join("; ")
            )))
        }
    }
}

/// Result of validating a freshly fetched class list. Issues are informational, a load is
/// never rejected because of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub checked: usize,
    pub duplicate_ids: Vec<ClassId>,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn check<'a, I>(classes: I) -> IntegrityReport
    where
        I: IntoIterator<Item = &'a OntologyClass>,
    {
        let mut report = IntegrityReport::default();
        let mut seen = BTreeSet::new();
        for class in classes {
            report.checked += 1;
            if !seen.insert(class.id.clone()) && !report.duplicate_ids.contains(&class.id) {
                report.duplicate_ids.push(class.id.clone());
            }
            if let Err(e) = class.validate() {
                report.issues.push(e.detail());
            }
        }
        report
    }

    pub fn is_clean(&self) -> bool {
        self.duplicate_ids.is_empty() && self.issues.is_empty()
    }
}
