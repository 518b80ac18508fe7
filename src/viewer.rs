use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};

use crate::{
    class::ClassId,
    config::DeckConfig,
    error::DeckError,
    event::{Effect, ViewerEvent},
    repository::Mutation,
    session::{SessionSnapshot, ViewerSession},
    source::{ClassSource, NodeData, RelationshipData, SourceFile},
};

/// Drives a [ViewerSession] against a [ClassSource].
///
/// The session lock is only held while an event is applied, never across a source call, so
/// UI events keep flowing while a load is in flight. Loads answered after a newer load was
/// issued are discarded by the session.
pub struct Viewer<S> {
    source: S,
    session: Arc<Mutex<ViewerSession>>,
    default_source: Option<String>,
}

impl<S: ClassSource> Viewer<S> {
    pub fn new(source: S, config: &DeckConfig) -> Viewer<S> {
        Viewer::from_session(source, ViewerSession::new(config), config)
    }

    pub fn from_session(source: S, session: ViewerSession, config: &DeckConfig) -> Viewer<S> {
        Viewer {
            source,
            session: Arc::new(Mutex::new(session)),
            default_source: config.default_source.clone(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Shared handle to the session, for UI layers that render from it directly.
    pub fn session(&self) -> Arc<Mutex<ViewerSession>> {
        self.session.clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&ViewerSession) -> R) -> R {
        f(&self.session.lock())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Applies `event` and carries out every load it triggers. Returns the effects left for
    /// the UI (scrolling).
    pub async fn dispatch(&self, event: ViewerEvent) -> Vec<Effect> {
        let effects = self.session.lock().apply(event);
        self.run_effects(effects).await
    }

    async fn run_effects(&self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut ui_effects = Vec::new();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Load(ticket) => {
                    tracing::debug!(
                        "[Viewer] loading '{}' (generation {})",
                        ticket.source,
                        ticket.generation
                    );
                    let result = self.source.list_classes(&ticket.source).await;
                    let more = self
                        .session
                        .lock()
                        .apply(ViewerEvent::LoadCompleted { ticket, result });
                    queue.extend(more);
                }
                other => ui_effects.push(other),
            }
        }
        ui_effects
    }

    /// Lists the available source files. When nothing is selected yet, the configured
    /// default (or else the first file) is selected and loaded.
    pub async fn list_sources(&self) -> Result<Vec<SourceFile>, DeckError> {
        let files = match self.source.list_sources().await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("[Viewer] error listing source files: {e}");
                self.session.lock().apply(ViewerEvent::ReportError(format!(
                    "Failed to load OWL files: {}",
                    e.detail()
                )));
                return Err(e);
            }
        };
        let selected = self.read(|s| s.source().is_some() || s.is_loading());
        if !selected {
            let preferred = self
                .default_source
                .as_ref()
                .and_then(|name| files.iter().find(|f| &f.filename == name))
                .or_else(|| files.first());
            if let Some(file) = preferred {
                self.select_source(&file.filename).await;
            }
        }
        Ok(files)
    }

    pub async fn select_source(&self, filename: &str) -> Vec<Effect> {
        self.dispatch(ViewerEvent::SelectSource(filename.to_string()))
            .await
    }

    pub async fn refresh(&self) -> Vec<Effect> {
        self.dispatch(ViewerEvent::Refresh).await
    }

    fn require_source(&self) -> Result<String, DeckError> {
        let source = self.read(|s| s.source().map(str::to_string));
        match source {
            Some(source) => Ok(source),
            None => {
                let e = DeckError::NoSourceSelected;
                self.session
                    .lock()
                    .apply(ViewerEvent::ReportError(e.to_string()));
                Err(e)
            }
        }
    }

    async fn finish_mutation<T>(
        &self,
        mutation: Mutation,
        result: Result<T, DeckError>,
    ) -> Result<T, DeckError> {
        match result {
            Ok(value) => {
                self.dispatch(ViewerEvent::MutationSucceeded(mutation)).await;
                Ok(value)
            }
            Err(e) => {
                self.session.lock().apply(ViewerEvent::MutationFailed {
                    mutation,
                    message: e.detail(),
                });
                Err(e)
            }
        }
    }

    pub async fn create_node(&self, data: &NodeData) -> Result<ClassId, DeckError> {
        let source = self.require_source()?;
        let result = self.source.create_node(&source, data).await;
        self.finish_mutation(Mutation::CreateNode, result).await
    }

    pub async fn update_node(&self, id: &ClassId, data: &NodeData) -> Result<(), DeckError> {
        let source = self.require_source()?;
        let result = self.source.update_node(&source, id, data).await;
        self.finish_mutation(Mutation::UpdateNode { id: id.clone() }, result)
            .await
    }

    pub async fn delete_node(&self, id: &ClassId) -> Result<(), DeckError> {
        let source = self.require_source()?;
        let result = self.source.delete_node(&source, id).await;
        self.finish_mutation(Mutation::DeleteNode { id: id.clone() }, result)
            .await
    }

    pub async fn create_relationship(&self, data: &RelationshipData) -> Result<(), DeckError> {
        let source = self.require_source()?;
        let result = self.source.create_relationship(&source, data).await;
        let mutation = Mutation::CreateRelationship {
            source: data.source.clone(),
            target: data.target.clone(),
        };
        self.finish_mutation(mutation, result).await
    }
}
