//! Data sources for ontology classes.
//!
//! [ClassSource] is the seam to whatever owns the ontology files (an HTTP API in the browser,
//! a directory of JSON dumps on the command line). The viewer never edits classes itself: it
//! asks the source to, and re-fetches the whole list on success.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, future::Future};

#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

use crate::{
    class::{Category, ClassId, OntologyClass},
    error::DeckError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_count: Option<usize>,
}

/// Payload for creating or updating a class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClassId>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_class: Option<String>,
    #[serde(default)]
    pub superclasses: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    /// `source` becomes a subclass of `target`.
    #[default]
    Subclass,
    /// `target` is recorded as a property of `source`.
    Property,
    /// `target` is recorded as an instance of `source`.
    Instance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipData {
    pub source: ClassId,
    pub target: ClassId,
    #[serde(default, rename = "type")]
    pub kind: RelationshipKind,
    /// Display name for property/instance entries. Falls back to the target's label.
    #[serde(default)]
    pub label: String,
}

pub trait ClassSource: Sync {
    fn list_sources(
        &self,
    ) -> impl Future<Output = Result<Vec<SourceFile>, DeckError>> + Send;

    fn list_classes(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<Vec<OntologyClass>, DeckError>> + Send;

    /// Returns the id assigned to the new class.
    fn create_node(
        &self,
        source: &str,
        data: &NodeData,
    ) -> impl Future<Output = Result<ClassId, DeckError>> + Send;

    fn update_node(
        &self,
        source: &str,
        id: &ClassId,
        data: &NodeData,
    ) -> impl Future<Output = Result<(), DeckError>> + Send;

    fn delete_node(
        &self,
        source: &str,
        id: &ClassId,
    ) -> impl Future<Output = Result<(), DeckError>> + Send;

    fn create_relationship(
        &self,
        source: &str,
        data: &RelationshipData,
    ) -> impl Future<Output = Result<(), DeckError>> + Send;
}

/// Edits on a class list, shared by the in-memory and file-backed sources. Related-name lists
/// and their counters are kept in step.
pub mod edit {
    use super::*;

    fn position(classes: &[OntologyClass], id: &ClassId) -> Result<usize, DeckError> {
        classes
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| DeckError::NotFound(format!("class '{id}'")))
    }

    fn position_by_name(classes: &[OntologyClass], name: &str) -> Option<usize> {
        classes
            .iter()
            .position(|c| c.label == name || c.local_name == name)
    }

    fn push_unique(list: &mut Vec<String>, name: &str) {
        if !list.iter().any(|n| n == name) {
            list.push(name.to_string());
        }
    }

    fn sync_hierarchy_counts(class: &mut OntologyClass) {
        class.stats.subclasses_count = class.subclasses_list.len();
        class.stats.superclasses_count = class.superclasses_list.len();
    }

    fn reject_self_parent(
        label: &str,
        local_name: &str,
        parents: &[String],
    ) -> Result<(), DeckError> {
        let own_name = |p: &&String| {
            p.as_str() == label || (!local_name.is_empty() && p.as_str() == local_name)
        };
        match parents.iter().find(own_name) {
            Some(name) => Err(DeckError::Integrity(format!(
                "class '{name}' cannot be its own superclass"
            ))),
            None => Ok(()),
        }
    }

    /// Derives an id from a label: lowercase, non-alphanumerics collapsed to `_`.
    pub fn slug(label: &str) -> String {
        let mut slug = String::with_capacity(label.len());
        for c in label.trim().chars() {
            if c.is_alphanumeric() {
                slug.extend(c.to_lowercase());
            } else if !slug.ends_with('_') {
                slug.push('_');
            }
        }
        slug.trim_matches('_').to_string()
    }

    fn attach_to_parents(classes: &mut [OntologyClass], child: usize) {
        let label = classes[child].label.clone();
        let parents = classes[child].superclasses_list.clone();
        let mut depth = 0;
        for parent in parents.iter() {
            if let Some(p) = position_by_name(classes, parent) {
                push_unique(&mut classes[p].subclasses_list, &label);
                sync_hierarchy_counts(&mut classes[p]);
                depth = depth.max(classes[p].stats.hierarchy_depth + 1);
            }
        }
        classes[child].stats.hierarchy_depth = depth;
        sync_hierarchy_counts(&mut classes[child]);
    }

    fn detach_from_parents(classes: &mut [OntologyClass], child: usize) {
        let label = classes[child].label.clone();
        let parents = classes[child].superclasses_list.clone();
        for parent in parents.iter() {
            if let Some(p) = position_by_name(classes, parent) {
                classes[p].subclasses_list.retain(|n| n != &label);
                sync_hierarchy_counts(&mut classes[p]);
            }
        }
    }

    pub fn create_node(
        classes: &mut Vec<OntologyClass>,
        data: &NodeData,
    ) -> Result<ClassId, DeckError> {
        let label = data.label.trim();
        if label.is_empty() {
            return Err(DeckError::Integrity("label is required".to_string()));
        }
        let id = data
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| ClassId::new(slug(label)));
        if id.is_empty() {
            return Err(DeckError::Integrity(format!(
                "cannot derive an id from label '{label}'"
            )));
        }
        if classes.iter().any(|c| c.id == id) {
            return Err(DeckError::Integrity(format!("class id '{id}' already exists")));
        }
        let local_name = data
            .local_name
            .clone()
            .unwrap_or_else(|| label.replace(char::is_whitespace, ""));
        reject_self_parent(label, &local_name, &data.superclasses)?;
        classes.push(OntologyClass {
            id: id.clone(),
            label: label.to_string(),
            local_name,
            root_class: data.root_class.clone(),
            category: data.category,
            description: data.description.clone(),
            superclasses_list: data.superclasses.clone(),
            ..Default::default()
        });
        let child = classes.len() - 1;
        attach_to_parents(classes, child);
        Ok(id)
    }

    pub fn update_node(
        classes: &mut [OntologyClass],
        id: &ClassId,
        data: &NodeData,
    ) -> Result<(), DeckError> {
        let idx = position(classes, id)?;
        let label = data.label.trim().to_string();
        if label.is_empty() {
            return Err(DeckError::Integrity("label is required".to_string()));
        }
        let local_name = data
            .local_name
            .clone()
            .unwrap_or_else(|| classes[idx].local_name.clone());
        reject_self_parent(&label, &local_name, &data.superclasses)?;
        detach_from_parents(classes, idx);

        let old_label = std::mem::replace(&mut classes[idx].label, label.clone());
        if old_label != label {
            for class in classes.iter_mut() {
                for list in [&mut class.superclasses_list, &mut class.subclasses_list] {
                    for name in list.iter_mut().filter(|n| **n == old_label) {
                        *name = label.clone();
                    }
                }
            }
        }

        let class = &mut classes[idx];
        class.local_name = local_name;
        class.description = data.description.clone();
        class.category = data.category;
        class.root_class = data.root_class.clone();
        class.superclasses_list = data.superclasses.clone();
        attach_to_parents(classes, idx);
        Ok(())
    }

    pub fn delete_node(classes: &mut Vec<OntologyClass>, id: &ClassId) -> Result<(), DeckError> {
        let idx = position(classes, id)?;
        detach_from_parents(classes, idx);
        let removed = classes.remove(idx);
        for class in classes.iter_mut() {
            let before = class.superclasses_list.len();
            class.superclasses_list.retain(|n| n != &removed.label);
            class.subclasses_list.retain(|n| n != &removed.label);
            if class.superclasses_list.len() != before {
                tracing::debug!(
                    "[edit::delete_node] '{}' lost superclass '{}'",
                    class.label,
                    removed.label
                );
            }
            sync_hierarchy_counts(class);
        }
        Ok(())
    }

    pub fn create_relationship(
        classes: &mut [OntologyClass],
        data: &RelationshipData,
    ) -> Result<(), DeckError> {
        if data.source == data.target {
            return Err(DeckError::Integrity(
                "a class cannot be related to itself".to_string(),
            ));
        }
        let src = position(classes, &data.source)?;
        let tgt = position(classes, &data.target)?;
        let target_label = classes[tgt].label.clone();
        let name = if data.label.trim().is_empty() {
            target_label.clone()
        } else {
            data.label.trim().to_string()
        };
        match data.kind {
            RelationshipKind::Subclass => {
                let class = &classes[src];
                reject_self_parent(
                    &class.label,
                    &class.local_name,
                    std::slice::from_ref(&target_label),
                )?;
                detach_from_parents(classes, src);
                push_unique(&mut classes[src].superclasses_list, &target_label);
                attach_to_parents(classes, src);
            }
            RelationshipKind::Property => {
                let class = &mut classes[src];
                push_unique(&mut class.properties_list, &name);
                class.stats.properties_count = class.properties_list.len();
            }
            RelationshipKind::Instance => {
                let class = &mut classes[src];
                push_unique(&mut class.instances_list, &name);
                class.stats.instances_count = class.instances_list.len();
            }
        }
        Ok(())
    }
}

/// In-memory source, keyed by file name.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<BTreeMap<String, Vec<OntologyClass>>>,
}

impl MemorySource {
    pub fn new() -> MemorySource {
        MemorySource::default()
    }

    pub fn with_file<S: Into<String>>(self, name: S, classes: Vec<OntologyClass>) -> MemorySource {
        self.files.write().insert(name.into(), classes);
        self
    }

    pub fn insert_file<S: Into<String>>(&self, name: S, classes: Vec<OntologyClass>) {
        self.files.write().insert(name.into(), classes);
    }

    fn edit<T>(
        &self,
        source: &str,
        op: impl FnOnce(&mut Vec<OntologyClass>) -> Result<T, DeckError>,
    ) -> Result<T, DeckError> {
        let mut files = self.files.write();
        let classes = files
            .get_mut(source)
            .ok_or_else(|| DeckError::NotFound(format!("source file '{source}'")))?;
        op(classes)
    }
}

impl ClassSource for MemorySource {
    async fn list_sources(&self) -> Result<Vec<SourceFile>, DeckError> {
        Ok(self
            .files
            .read()
            .iter()
            .map(|(name, classes)| SourceFile {
                filename: name.clone(),
                class_count: Some(classes.len()),
            })
            .collect())
    }

    async fn list_classes(&self, source: &str) -> Result<Vec<OntologyClass>, DeckError> {
        self.files
            .read()
            .get(source)
            .cloned()
            .ok_or_else(|| DeckError::NotFound(format!("source file '{source}'")))
    }

    async fn create_node(&self, source: &str, data: &NodeData) -> Result<ClassId, DeckError> {
        self.edit(source, |classes| edit::create_node(classes, data))
    }

    async fn update_node(
        &self,
        source: &str,
        id: &ClassId,
        data: &NodeData,
    ) -> Result<(), DeckError> {
        self.edit(source, |classes| edit::update_node(classes, id, data))
    }

    async fn delete_node(&self, source: &str, id: &ClassId) -> Result<(), DeckError> {
        self.edit(source, |classes| edit::delete_node(classes, id))
    }

    async fn create_relationship(
        &self,
        source: &str,
        data: &RelationshipData,
    ) -> Result<(), DeckError> {
        self.edit(source, |classes| edit::create_relationship(classes, data))
    }
}

/// A directory of `*.json` class dumps, one JSON array of classes per file.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct JsonDirSource {
    root: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl JsonDirSource {
    pub fn new<P: Into<PathBuf>>(root: P) -> JsonDirSource {
        JsonDirSource {
            root: root.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, source: &str) -> Result<PathBuf, DeckError> {
        let name = Path::new(source);
        let plain = name.components().count() == 1
            && name.file_name().is_some_and(|f| f == name.as_os_str());
        if !plain || !source.ends_with(".json") {
            tracing::warn!("[JsonDirSource] refusing source name {source:?}");
            return Err(DeckError::PermissionDenied);
        }
        Ok(self.root.join(name))
    }

    async fn read_classes(&self, path: &Path) -> Result<Vec<OntologyClass>, DeckError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn edit<T>(
        &self,
        source: &str,
        op: impl FnOnce(&mut Vec<OntologyClass>) -> Result<T, DeckError> + Send,
    ) -> Result<T, DeckError> {
        let path = self.path_for(source)?;
        let _guard = self.write_lock.lock().await;
        let mut classes = self.read_classes(&path).await?;
        let value = op(&mut classes)?;
        let content = serde_json::to_string_pretty(&classes)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!("[JsonDirSource] wrote {} classes to {:?}", classes.len(), path);
        Ok(value)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ClassSource for JsonDirSource {
    async fn list_sources(&self) -> Result<Vec<SourceFile>, DeckError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(SourceFile {
                        filename: name.to_string(),
                        class_count: None,
                    });
                }
            }
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    async fn list_classes(&self, source: &str) -> Result<Vec<OntologyClass>, DeckError> {
        let path = self.path_for(source)?;
        self.read_classes(&path).await
    }

    async fn create_node(&self, source: &str, data: &NodeData) -> Result<ClassId, DeckError> {
        self.edit(source, |classes| edit::create_node(classes, data))
            .await
    }

    async fn update_node(
        &self,
        source: &str,
        id: &ClassId,
        data: &NodeData,
    ) -> Result<(), DeckError> {
        self.edit(source, |classes| edit::update_node(classes, id, data))
            .await
    }

    async fn delete_node(&self, source: &str, id: &ClassId) -> Result<(), DeckError> {
        self.edit(source, |classes| edit::delete_node(classes, id))
            .await
    }

    async fn create_relationship(
        &self,
        source: &str,
        data: &RelationshipData,
    ) -> Result<(), DeckError> {
        self.edit(source, |classes| edit::create_relationship(classes, data))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::class;
    use test_log::test;

    fn get<'a>(classes: &'a [OntologyClass], id: &str) -> &'a OntologyClass {
        classes.iter().find(|c| c.id.as_str() == id).unwrap()
    }

    fn hierarchy() -> Vec<OntologyClass> {
        let mut symptom = class("symptom", "Symptom", &[], Some("Thing"));
        symptom.subclasses_list = vec!["Fever".to_string()];
        symptom.stats.subclasses_count = 1;
        let mut fever = class("fever", "Fever", &["Symptom"], Some("Thing"));
        fever.stats.superclasses_count = 1;
        fever.stats.hierarchy_depth = 1;
        vec![symptom, fever]
    }

    #[test]
    fn test_slug() {
        assert_eq!(edit::slug("  Heart  Rate (bpm) "), "heart_rate_bpm");
        assert_eq!(edit::slug("!!"), "");
    }

    #[test]
    fn test_create_node_links_parent() {
        let mut classes = hierarchy();
        let id = edit::create_node(
            &mut classes,
            &NodeData {
                label: "Cough".to_string(),
                superclasses: vec!["Symptom".to_string()],
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(id.as_str(), "cough");
        let symptom = get(&classes, "symptom");
        assert_eq!(symptom.subclasses_list, vec!["Fever", "Cough"]);
        assert_eq!(symptom.stats.subclasses_count, 2);
        assert_eq!(get(&classes, "cough").stats.hierarchy_depth, 1);
        assert!(classes.iter().all(|c| c.validate().is_ok()));

        let dup = edit::create_node(
            &mut classes,
            &NodeData {
                label: "cough".to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(dup, Err(DeckError::Integrity(_))));
    }

    #[test]
    fn test_update_node_renames_references() {
        let mut classes = hierarchy();
        edit::update_node(
            &mut classes,
            &"symptom".into(),
            &NodeData {
                label: "Clinical Sign".to_string(),
                category: Some(Category::Symptom),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(get(&classes, "fever").superclasses_list, vec!["Clinical Sign"]);
        assert_eq!(get(&classes, "symptom").subclasses_list, vec!["Fever"]);
        assert_eq!(get(&classes, "symptom").category, Some(Category::Symptom));
    }

    #[test]
    fn test_delete_node_unlinks() {
        let mut classes = hierarchy();
        edit::delete_node(&mut classes, &"fever".into()).unwrap();
        let symptom = get(&classes, "symptom");
        assert!(symptom.subclasses_list.is_empty());
        assert_eq!(symptom.stats.subclasses_count, 0);
        assert!(matches!(
            edit::delete_node(&mut classes, &"fever".into()),
            Err(DeckError::NotFound(_))
        ));
    }

    #[test]
    fn test_relationships() {
        let mut classes = hierarchy();
        classes.push(class("nurse", "Nurse", &[], Some("Thing")));
        edit::create_relationship(
            &mut classes,
            &RelationshipData {
                source: "nurse".into(),
                target: "symptom".into(),
                kind: RelationshipKind::Subclass,
                label: String::new(),
            },
        )
        .unwrap();
        assert_eq!(get(&classes, "nurse").superclasses_list, vec!["Symptom"]);
        assert_eq!(get(&classes, "symptom").stats.subclasses_count, 2);

        edit::create_relationship(
            &mut classes,
            &RelationshipData {
                source: "fever".into(),
                target: "nurse".into(),
                kind: RelationshipKind::Property,
                label: "reportedBy".to_string(),
            },
        )
        .unwrap();
        assert_eq!(get(&classes, "fever").properties_list, vec!["reportedBy"]);
        assert_eq!(get(&classes, "fever").stats.properties_count, 1);

        let err = edit::create_relationship(
            &mut classes,
            &RelationshipData {
                source: "fever".into(),
                target: "fever".into(),
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(DeckError::Integrity(_))));
    }

    #[test]
    fn test_self_superclass_rejected() {
        let mut classes = hierarchy();
        let err = edit::create_node(
            &mut classes,
            &NodeData {
                label: "Chill".to_string(),
                superclasses: vec!["Chill".to_string()],
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(DeckError::Integrity(_))));
        assert_eq!(classes.len(), 2);

        let err = edit::update_node(
            &mut classes,
            &"fever".into(),
            &NodeData {
                label: "Fever".to_string(),
                superclasses: vec!["Symptom".to_string(), "Fever".to_string()],
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(DeckError::Integrity(_))));
        // Nothing was detached before the rejection.
        assert_eq!(get(&classes, "fever").superclasses_list, vec!["Symptom"]);
        assert_eq!(get(&classes, "symptom").subclasses_list, vec!["Fever"]);

        // A different class sharing the label is still the same superclass name.
        classes.push(class("fever-2", "Fever", &[], None));
        let err = edit::create_relationship(
            &mut classes,
            &RelationshipData {
                source: "fever-2".into(),
                target: "fever".into(),
                kind: RelationshipKind::Subclass,
                label: String::new(),
            },
        );
        assert!(matches!(err, Err(DeckError::Integrity(_))));
        assert!(get(&classes, "fever").subclasses_list.is_empty());
        assert_eq!(get(&classes, "fever").stats.hierarchy_depth, 1);
    }

    #[test(tokio::test)]
    async fn test_memory_source_round_trip() {
        let source = MemorySource::new().with_file("clinical.owl", hierarchy());
        let files = source.list_sources().await.unwrap();
        assert_eq!(files[0].filename, "clinical.owl");
        assert_eq!(files[0].class_count, Some(2));
        source.delete_node("clinical.owl", &"fever".into()).await.unwrap();
        assert_eq!(source.list_classes("clinical.owl").await.unwrap().len(), 1);
        assert!(matches!(
            source.list_classes("missing.owl").await,
            Err(DeckError::NotFound(_))
        ));
    }

    #[test]
    fn test_json_dir_rejects_traversal() {
        let source = JsonDirSource::new("/tmp");
        assert_eq!(source.path_for("../etc.json"), Err(DeckError::PermissionDenied));
        assert_eq!(source.path_for("a/b.json"), Err(DeckError::PermissionDenied));
        assert_eq!(source.path_for("notes.txt"), Err(DeckError::PermissionDenied));
        assert!(source.path_for("clinical.json").is_ok());
    }
}
