//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times, subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A small clinical ontology dump, the shape an extraction backend produces.
pub const CLINICAL_JSON: &str = r#"[
  {
    "id": "symptom",
    "label": "Symptom",
    "local_name": "Symptom",
    "root_class": "Thing",
    "category": "symptom",
    "description": "An observable sign of disease",
    "superclasses_list": [],
    "subclasses_list": ["Fever", "Cough", "Rash"],
    "properties_list": [],
    "instances_list": [],
    "stats": {"subclasses_count": 3, "properties_count": 0, "instances_count": 0, "hierarchy_depth": 0, "superclasses_count": 0}
  },
  {
    "id": "fever",
    "label": "Fever",
    "local_name": "Fever",
    "root_class": "Thing",
    "category": "symptom",
    "superclasses_list": ["Symptom"],
    "subclasses_list": [],
    "properties_list": ["hasTemperature"],
    "instances_list": [],
    "stats": {"subclasses_count": 0, "properties_count": 1, "instances_count": 0, "hierarchy_depth": 1, "superclasses_count": 1}
  },
  {
    "id": "cough",
    "label": "Cough",
    "local_name": "Cough",
    "root_class": "Thing",
    "category": "symptom",
    "superclasses_list": ["Symptom"],
    "subclasses_list": [],
    "properties_list": [],
    "instances_list": [],
    "stats": {"subclasses_count": 0, "properties_count": 0, "instances_count": 0, "hierarchy_depth": 1, "superclasses_count": 1}
  },
  {
    "id": "rash",
    "label": "Rash",
    "local_name": "Rash",
    "root_class": "Thing",
    "category": "symptom",
    "superclasses_list": ["Symptom"],
    "subclasses_list": [],
    "properties_list": [],
    "instances_list": ["contactRash01"],
    "stats": {"subclasses_count": 0, "properties_count": 0, "instances_count": 1, "hierarchy_depth": 1, "superclasses_count": 1}
  },
  {
    "id": "nurse",
    "label": "Nurse",
    "local_name": "Nurse",
    "root_class": "Agent",
    "category": "role",
    "superclasses_list": [],
    "subclasses_list": [],
    "properties_list": [],
    "instances_list": [],
    "stats": {"subclasses_count": 0, "properties_count": 0, "instances_count": 0, "hierarchy_depth": 0, "superclasses_count": 0}
  }
]"#;

/// Creates `<temp_dir>/ontologies/` holding `clinical.json`, a one-class `tiny.json` and a
/// `notes.txt` that is not a class dump.
#[allow(dead_code)]
pub fn create_test_ontologies(temp_dir: &TempDir) -> PathBuf {
    let dir = temp_dir.path().join("ontologies");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("clinical.json"), CLINICAL_JSON).unwrap();
    std::fs::write(
        dir.join("tiny.json"),
        r#"[{"id": "thing", "label": "Thing", "category": "something-new"}]"#,
    )
    .unwrap();
    std::fs::write(dir.join("notes.txt"), "not an ontology").unwrap();
    dir
}
