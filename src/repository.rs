//! Holder of the raw class list for the selected source file.
//!
//! Loads are issued as [LoadTicket]s carrying a generation number. Only the ticket from the
//! most recent [ClassRepository::begin_load] may complete, so a slow response for an earlier
//! selection can no longer overwrite a newer one.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    class::{ClassId, IntegrityReport, OntologyClass},
    error::DeckError,
};

/// What a mutation did, so the session can place the cursor after the reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    CreateNode,
    UpdateNode { id: ClassId },
    DeleteNode { id: ClassId },
    CreateRelationship { source: ClassId, target: ClassId },
}

impl Mutation {
    /// Prefix of the message shown when the source rejects this mutation.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Mutation::CreateNode | Mutation::UpdateNode { .. } => "Failed to save node",
            Mutation::DeleteNode { .. } => "Failed to delete node",
            Mutation::CreateRelationship { .. } => "Failed to save relationship",
        }
    }
}

/// Why a load was started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadCause {
    /// A source was selected (or re-selected): per-card state starts over.
    Select,
    /// The participant asked for fresh data from the same source.
    Refresh,
    /// Re-fetch after a successful mutation. `index` and `len` describe the visible list at
    /// the time the mutation was committed.
    Mutation {
        mutation: Mutation,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadTicket {
    pub source: String,
    pub generation: u64,
    pub cause: LoadCause,
}

#[derive(Debug, Clone, Default)]
pub struct ClassRepository {
    source: Option<String>,
    classes: Vec<Arc<OntologyClass>>,
    generation: u64,
    loading: bool,
    /// A selection is in flight. Tickets superseding it are issued as selections.
    select_pending: bool,
    integrity: IntegrityReport,
}

impl ClassRepository {
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn classes(&self) -> &[Arc<OntologyClass>] {
        &self.classes
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn integrity(&self) -> &IntegrityReport {
        &self.integrity
    }

    pub fn get(&self, id: &ClassId) -> Option<&Arc<OntologyClass>> {
        self.classes.iter().find(|c| &c.id == id)
    }

    /// Looks a class up by a name appearing in another class's hierarchy lists.
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<OntologyClass>> {
        self.classes
            .iter()
            .find(|c| c.label == name || c.local_name == name)
    }

    /// Selects `source` and issues a ticket for its class list. Any earlier ticket is
    /// invalidated.
    pub fn begin_load(&mut self, source: &str, cause: LoadCause) -> LoadTicket {
        let cause = match cause {
            LoadCause::Select => {
                self.select_pending = true;
                LoadCause::Select
            }
            other if self.select_pending => {
                tracing::debug!(
                    "[ClassRepository] {:?} supersedes a pending selection of '{}'",
                    other,
                    source
                );
                LoadCause::Select
            }
            other => other,
        };
        self.generation += 1;
        self.source = Some(source.to_string());
        self.loading = true;
        tracing::debug!(
            "[ClassRepository] load #{} of '{}' ({:?})",
            self.generation,
            source,
            cause
        );
        LoadTicket {
            source: source.to_string(),
            generation: self.generation,
            cause,
        }
    }

    fn check_current(&self, ticket: &LoadTicket) -> Result<(), DeckError> {
        if ticket.generation != self.generation {
            tracing::warn!(
                "[ClassRepository] dropping stale load #{} of '{}', current is #{}",
                ticket.generation,
                ticket.source,
                self.generation
            );
            return Err(DeckError::StaleLoad {
                source_file: ticket.source.clone(),
                generation: ticket.generation,
                current: self.generation,
            });
        }
        Ok(())
    }

    /// Replaces the class list wholesale with the answer to `ticket`.
    pub fn complete(
        &mut self,
        ticket: &LoadTicket,
        classes: Vec<OntologyClass>,
    ) -> Result<&IntegrityReport, DeckError> {
        self.check_current(ticket)?;
        let report = IntegrityReport::check(&classes);
        if !report.is_clean() {
            for id in report.duplicate_ids.iter() {
                tracing::warn!("[ClassRepository] duplicate class id {id} in '{}'", ticket.source);
            }
            for issue in report.issues.iter() {
                tracing::warn!("[ClassRepository] {issue}");
            }
        }
        self.classes = classes.into_iter().map(Arc::new).collect();
        self.integrity = report;
        self.loading = false;
        self.select_pending = false;
        Ok(&self.integrity)
    }

    /// Marks the load for `ticket` as failed. The class list is emptied, mirroring a fresh
    /// selection that could not be fetched.
    pub fn fail(&mut self, ticket: &LoadTicket) -> Result<(), DeckError> {
        self.check_current(ticket)?;
        self.classes.clear();
        self.integrity = IntegrityReport::default();
        self.loading = false;
        self.select_pending = false;
        Ok(())
    }

    /// Deselects the source. Bumps the generation so in-flight loads are discarded.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.source = None;
        self.classes.clear();
        self.integrity = IntegrityReport::default();
        self.loading = false;
        self.select_pending = false;
    }
}
