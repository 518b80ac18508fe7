//! End-to-end behavior of the viewer session, driven through events only.

use crate::{
    cards::DetailSection,
    class::{Category, ClassId, OntologyClass},
    config::DeckConfig,
    event::{Effect, ViewerEvent},
    keys::{Key, KeyInput},
    query::{Facet, SortKey},
    repository::Mutation,
    session::{Placeholder, ViewMode, ViewerSession},
    siblings::Direction,
    tests::helpers::{class, complete_loads, loaded_session, visible_labels},
};
use test_log::test;

fn clinical() -> Vec<OntologyClass> {
    let mut fever = class("fever", "Fever", &["Symptom"], Some("Thing"));
    fever.category = Some(Category::Symptom);
    let mut cough = class("cough", "Cough", &["Symptom"], Some("Thing"));
    cough.category = Some(Category::Symptom);
    let mut rash = class("rash", "Rash", &["Symptom"], Some("Thing"));
    rash.category = Some(Category::Symptom);
    let mut nurse = class("nurse", "Nurse", &["Role"], Some("Thing"));
    nurse.category = Some(Category::Role);
    let orphan = class("orphan", "Orphan", &[], None);
    vec![fever, cough, rash, nurse, orphan]
}

fn current_label(session: &ViewerSession) -> Option<String> {
    session.current().map(|c| c.label.clone())
}

#[test]
fn test_loaded_list_is_sorted_by_name() {
    let session = loaded_session(clinical());
    assert_eq!(
        visible_labels(&session),
        vec!["Cough", "Fever", "Nurse", "Orphan", "Rash"]
    );
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.placeholder(), None);
}

#[test]
fn test_suggestion_lands_on_class_after_search_cleared() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::SetViewMode(ViewMode::Grid));
    session.apply(ViewerEvent::SearchChanged("ras".to_string()));
    assert_eq!(visible_labels(&session), vec!["Rash"]);
    assert_eq!(session.suggestions().items.len(), 1);

    let effects = session.apply(ViewerEvent::SuggestionAccept);
    assert_eq!(effects, vec![Effect::ScrollToTop]);
    assert_eq!(session.query().search, "");
    assert_eq!(session.visible().len(), 5);
    assert_eq!(current_label(&session).as_deref(), Some("Rash"));
    assert_eq!(session.current_index(), 4);
    assert_eq!(session.view_mode(), ViewMode::Single);
    assert_eq!(session.history().current(), Some(&ClassId::from("rash")));
    assert!(!session.suggestions().open);
    assert_eq!(session.pending_navigation(), None);
}

#[test]
fn test_suggestion_navigation_waits_for_non_empty_list() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::CategoryFilterChanged(Facet::Only(Category::Device)));
    assert!(session.visible().is_empty());
    assert_eq!(session.placeholder(), Some(Placeholder::NoMatches));

    session.apply(ViewerEvent::SuggestionPicked("nurse".into()));
    assert_eq!(session.pending_navigation(), Some(&ClassId::from("nurse")));

    let effects = session.apply(ViewerEvent::CategoryFilterChanged(Facet::All));
    assert_eq!(effects, vec![Effect::ScrollToTop]);
    assert_eq!(current_label(&session).as_deref(), Some("Nurse"));
    assert_eq!(session.pending_navigation(), None);
}

#[test]
fn test_suggestion_missing_from_filtered_list_is_dropped() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::CategoryFilterChanged(Facet::Only(Category::Symptom)));
    session.apply(ViewerEvent::SuggestionPicked("nurse".into()));
    assert_eq!(session.pending_navigation(), None);
    assert_eq!(session.current_index(), 0);
    assert!(session.history().is_empty());
}

#[test]
fn test_suggestion_keyboard_selection() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::SearchChanged("r".to_string()));
    // Fever, Nurse, Orphan, Rash all contain an "r".
    assert_eq!(session.suggestions().items.len(), 4);
    session.apply(ViewerEvent::SuggestionMove(Direction::Next));
    session.apply(ViewerEvent::SuggestionMove(Direction::Next));
    assert_eq!(session.suggestions().selected, Some(1));
    session.apply(ViewerEvent::SuggestionMove(Direction::Previous));
    session.apply(ViewerEvent::SuggestionMove(Direction::Previous));
    assert_eq!(session.suggestions().selected, None);
    session.apply(ViewerEvent::SuggestionMove(Direction::Next));
    let target = session.suggestions().items[0].id.clone();
    session.apply(ViewerEvent::SuggestionAccept);
    assert_eq!(session.current().map(|c| c.id.clone()), Some(target));
}

#[test]
fn test_delete_of_last_card_moves_cursor_back() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::JumpTo(4));
    let effects = session.apply(ViewerEvent::MutationSucceeded(Mutation::DeleteNode {
        id: "rash".into(),
    }));
    let remaining: Vec<_> = clinical().into_iter().filter(|c| c.id.as_str() != "rash").collect();
    complete_loads(&mut session, effects, &remaining);
    assert_eq!(session.visible().len(), 4);
    assert_eq!(session.current_index(), 3);
    assert_eq!(current_label(&session).as_deref(), Some("Orphan"));
}

#[test]
fn test_delete_in_middle_keeps_position() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::JumpTo(1));
    let effects = session.apply(ViewerEvent::MutationSucceeded(Mutation::DeleteNode {
        id: "fever".into(),
    }));
    let remaining: Vec<_> = clinical().into_iter().filter(|c| c.id.as_str() != "fever").collect();
    complete_loads(&mut session, effects, &remaining);
    assert_eq!(session.current_index(), 1);
    assert_eq!(current_label(&session).as_deref(), Some("Nurse"));
}

#[test]
fn test_delete_of_other_card_keeps_current_class() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::JumpTo(1));
    let effects = session.apply(ViewerEvent::MutationSucceeded(Mutation::DeleteNode {
        id: "cough".into(),
    }));
    let remaining: Vec<_> = clinical().into_iter().filter(|c| c.id.as_str() != "cough").collect();
    complete_loads(&mut session, effects, &remaining);
    assert_eq!(current_label(&session).as_deref(), Some("Fever"));
    assert_eq!(session.current_index(), 0);

    // Deleting the last card from the one before it stays put too.
    session.apply(ViewerEvent::JumpTo(2));
    assert_eq!(current_label(&session).as_deref(), Some("Orphan"));
    let effects = session.apply(ViewerEvent::MutationSucceeded(Mutation::DeleteNode {
        id: "rash".into(),
    }));
    let remaining: Vec<_> = remaining.into_iter().filter(|c| c.id.as_str() != "rash").collect();
    complete_loads(&mut session, effects, &remaining);
    assert_eq!(visible_labels(&session), vec!["Fever", "Nurse", "Orphan"]);
    assert_eq!(current_label(&session).as_deref(), Some("Orphan"));
    assert_eq!(session.current_index(), 2);
}

#[test]
fn test_delete_of_only_card_leaves_empty_list() {
    let only = vec![class("solo", "Solo", &[], None)];
    let mut session = loaded_session(only);
    let effects = session.apply(ViewerEvent::MutationSucceeded(Mutation::DeleteNode {
        id: "solo".into(),
    }));
    complete_loads(&mut session, effects, &[]);
    assert_eq!(session.current_index(), 0);
    assert!(session.current().is_none());
    assert_eq!(session.placeholder(), Some(Placeholder::NoMatches));
}

#[test]
fn test_update_keeps_current_class() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::JumpTo(1));
    let effects = session.apply(ViewerEvent::MutationSucceeded(Mutation::UpdateNode {
        id: "fever".into(),
    }));
    let mut renamed = clinical();
    renamed[0].label = "Pyrexia".to_string();
    complete_loads(&mut session, effects, &renamed);
    assert_eq!(current_label(&session).as_deref(), Some("Pyrexia"));
}

#[test]
fn test_failed_mutation_sets_error_only() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::JumpTo(2));
    let effects = session.apply(ViewerEvent::MutationFailed {
        mutation: Mutation::CreateNode,
        message: "label is required".to_string(),
    });
    assert!(effects.is_empty());
    assert_eq!(session.error(), Some("Failed to save node: label is required"));
    assert_eq!(session.current_index(), 2);
    session.apply(ViewerEvent::DismissError);
    assert_eq!(session.error(), None);
}

#[test]
fn test_history_round_trip() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::JumpTo(0));
    session.apply(ViewerEvent::JumpTo(1));
    session.apply(ViewerEvent::JumpTo(2));
    assert!(session.history().can_go_back());

    session.apply(ViewerEvent::Back);
    assert_eq!(session.current_index(), 1);
    session.apply(ViewerEvent::Back);
    assert_eq!(session.current_index(), 0);
    assert!(!session.history().can_go_back());
    session.apply(ViewerEvent::Back);
    assert_eq!(session.current_index(), 0);

    session.apply(ViewerEvent::Forward);
    assert_eq!(session.current_index(), 1);
    assert!(session.history().can_go_forward());

    // A new jump discards the forward branch.
    session.apply(ViewerEvent::JumpTo(4));
    assert!(!session.history().can_go_forward());
    assert_eq!(session.history().len(), 3);
}

#[test]
fn test_history_survives_reordering() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::NavigateToName("Fever".to_string()));
    session.apply(ViewerEvent::NavigateToName("Rash".to_string()));
    session.apply(ViewerEvent::SortChanged(SortKey::Depth));
    session.apply(ViewerEvent::SetShuffle(true));
    session.apply(ViewerEvent::Back);
    assert_eq!(current_label(&session).as_deref(), Some("Fever"));
}

#[test]
fn test_history_step_to_hidden_class_keeps_cursor() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::NavigateToName("Nurse".to_string()));
    session.apply(ViewerEvent::NavigateToName("Fever".to_string()));
    session.apply(ViewerEvent::CategoryFilterChanged(Facet::Only(Category::Symptom)));
    let before = session.current_index();
    session.apply(ViewerEvent::Back);
    assert_eq!(session.current_index(), before);
    assert_eq!(session.history().current(), Some(&ClassId::from("nurse")));
}

#[test]
fn test_sibling_navigation_wraps_within_parent() {
    let mut session = loaded_session(clinical());
    // Cough, Fever, Rash share "Symptom".
    session.apply(ViewerEvent::NavigateToName("Rash".to_string()));
    let effects = session.apply(ViewerEvent::Sibling(Direction::Next));
    assert_eq!(effects, vec![Effect::ScrollToTop]);
    assert_eq!(current_label(&session).as_deref(), Some("Cough"));
    session.apply(ViewerEvent::Sibling(Direction::Previous));
    assert_eq!(current_label(&session).as_deref(), Some("Rash"));
    assert_eq!(session.current_parent(), Some("Symptom"));
    assert_eq!(session.current_siblings().len(), 3);
}

#[test]
fn test_sibling_navigation_without_parent_is_noop() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::NavigateToName("Orphan".to_string()));
    let history_len = session.history().len();
    let index = session.current_index();
    assert!(session.apply(ViewerEvent::Sibling(Direction::Next)).is_empty());
    assert!(session.apply(ViewerEvent::Wheel { delta_y: 120.0 }).is_empty());
    assert_eq!(session.current_index(), index);
    assert_eq!(session.history().len(), history_len);
}

#[test]
fn test_flip_survives_filters_and_clears_on_source_swap() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::NavigateToName("Fever".to_string()));
    session.apply(ViewerEvent::FlipCurrent);
    assert!(session.current_is_flipped());

    session.apply(ViewerEvent::CategoryFilterChanged(Facet::Only(Category::Role)));
    session.apply(ViewerEvent::CategoryFilterChanged(Facet::All));
    session.apply(ViewerEvent::NavigateToName("Fever".to_string()));
    assert!(session.current_is_flipped());

    let effects = session.apply(ViewerEvent::SelectSource("other.owl".to_string()));
    complete_loads(&mut session, effects, &clinical());
    assert!(session.cards().flipped().is_empty());
    assert_eq!(session.current_index(), 0);
}

#[test]
fn test_expansion_is_dropped_when_card_unmounts() {
    let mut session = loaded_session(clinical());
    let id = session.current().map(|c| c.id.clone()).unwrap();
    session.apply(ViewerEvent::ToggleSection(id.clone(), DetailSection::Subclasses));
    assert!(session.cards().is_expanded(&id, DetailSection::Subclasses));
    assert_eq!(session.snapshot().expanded, vec![DetailSection::Subclasses]);

    session.apply(ViewerEvent::JumpTo(3));
    assert!(!session.cards().is_expanded(&id, DetailSection::Subclasses));
}

#[test]
fn test_flipped_card_lets_arrows_scroll() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::NavigateToName("Cough".to_string()));
    session.apply(ViewerEvent::Key(KeyInput::new(Key::Space)));
    assert!(session.current_is_flipped());

    session.apply(ViewerEvent::Key(KeyInput::new(Key::ArrowDown)));
    assert_eq!(current_label(&session).as_deref(), Some("Cough"));

    session.apply(ViewerEvent::Key(KeyInput::new(Key::Space)));
    session.apply(ViewerEvent::Key(KeyInput::new(Key::ArrowDown)));
    assert_eq!(current_label(&session).as_deref(), Some("Fever"));
}

#[test]
fn test_random_does_not_record_history() {
    let mut session = loaded_session(clinical());
    for _ in 0..20 {
        session.apply(ViewerEvent::Random);
        assert!(session.current_index() < session.visible().len());
    }
    assert!(session.history().is_empty());
}

#[test]
fn test_shuffle_is_seeded() {
    let config = DeckConfig {
        shuffle: true,
        ..Default::default()
    };
    let order = |seed| {
        let mut session = ViewerSession::with_seed(&config, seed);
        let effects = session.apply(ViewerEvent::SelectSource("test.owl".to_string()));
        complete_loads(&mut session, effects, &clinical());
        visible_labels(&session)
    };
    assert_eq!(order(11), order(11));
    let mut sorted = order(11);
    sorted.sort();
    assert_eq!(sorted, vec!["Cough", "Fever", "Nurse", "Orphan", "Rash"]);
}

#[test]
fn test_stale_load_is_ignored() {
    let mut session = ViewerSession::with_seed(&DeckConfig::default(), 3);
    let first = session.apply(ViewerEvent::SelectSource("a.owl".to_string()));
    let second = session.apply(ViewerEvent::SelectSource("b.owl".to_string()));

    complete_loads(&mut session, first, &clinical());
    assert_eq!(session.placeholder(), Some(Placeholder::Loading));
    assert!(session.visible().is_empty());

    complete_loads(&mut session, second, &[class("x", "X", &[], None)]);
    assert_eq!(session.source(), Some("b.owl"));
    assert_eq!(visible_labels(&session), vec!["X"]);
}

fn flip_fever_then_switch(follow_up: ViewerEvent) -> ViewerSession {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::NavigateToName("Fever".to_string()));
    session.apply(ViewerEvent::FlipCurrent);
    assert_eq!(session.current_index(), 1);
    assert!(session.cards().flipped().contains(&ClassId::from("fever")));

    let select = session.apply(ViewerEvent::SelectSource("other.owl".to_string()));
    let reload = session.apply(follow_up);
    complete_loads(&mut session, select, &clinical());
    complete_loads(&mut session, reload, &clinical());
    session
}

#[test]
fn test_refresh_during_source_switch_still_resets() {
    let session = flip_fever_then_switch(ViewerEvent::Refresh);
    assert_eq!(session.source(), Some("other.owl"));
    assert!(session.cards().flipped().is_empty());
    assert_eq!(session.current_index(), 0);
    assert_eq!(current_label(&session).as_deref(), Some("Cough"));
}

#[test]
fn test_mutation_during_source_switch_still_resets() {
    let session = flip_fever_then_switch(ViewerEvent::MutationSucceeded(Mutation::UpdateNode {
        id: "fever".into(),
    }));
    assert_eq!(session.source(), Some("other.owl"));
    assert!(session.cards().flipped().is_empty());
    assert_eq!(session.current_index(), 0);
    assert!(!session.is_loading());
}

#[test]
fn test_clearing_source_shows_placeholder() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::SelectSource(String::new()));
    assert_eq!(session.placeholder(), Some(Placeholder::NoSource));
    assert!(session.current().is_none());
    assert!(session.apply(ViewerEvent::Refresh).is_empty());
}

#[test]
fn test_refresh_keeps_current_class() {
    let mut session = loaded_session(clinical());
    session.apply(ViewerEvent::NavigateToName("Nurse".to_string()));
    let effects = session.apply(ViewerEvent::Refresh);
    let mut reloaded = clinical();
    reloaded.push(class("ache", "Ache", &["Symptom"], None));
    complete_loads(&mut session, effects, &reloaded);
    assert_eq!(current_label(&session).as_deref(), Some("Nurse"));
    assert_eq!(session.current_index(), 3);
}
