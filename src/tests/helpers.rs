//! Shared test utilities for viewer session testing

use crate::{
    class::OntologyClass,
    config::DeckConfig,
    event::{Effect, ViewerEvent},
    session::ViewerSession,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A class whose label is `label` and whose superclasses are `parents`.
pub fn class(id: &str, label: &str, parents: &[&str], root: Option<&str>) -> OntologyClass {
    OntologyClass {
        id: id.into(),
        label: label.to_string(),
        local_name: label.replace(' ', ""),
        root_class: root.map(str::to_string),
        superclasses_list: parents.iter().map(|p| p.to_string()).collect(),
        stats: crate::class::ClassStats {
            superclasses_count: parents.len(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Feeds the ticket of every `Load` effect back with `classes`.
pub fn complete_loads(
    session: &mut ViewerSession,
    effects: Vec<Effect>,
    classes: &[OntologyClass],
) -> Vec<Effect> {
    let mut out = Vec::new();
    for effect in effects {
        match effect {
            Effect::Load(ticket) => out.extend(session.apply(ViewerEvent::LoadCompleted {
                ticket,
                result: Ok(classes.to_vec()),
            })),
            other => out.push(other),
        }
    }
    out
}

/// A seeded session with `classes` loaded from "test.owl".
pub fn loaded_session(classes: Vec<OntologyClass>) -> ViewerSession {
    init_logging();
    let mut session = ViewerSession::with_seed(&DeckConfig::default(), 7);
    let effects = session.apply(ViewerEvent::SelectSource("test.owl".to_string()));
    complete_loads(&mut session, effects, &classes);
    session
}

/// Labels of the visible list, in order.
pub fn visible_labels(session: &ViewerSession) -> Vec<String> {
    session.visible().iter().map(|c| c.label.clone()).collect()
}
