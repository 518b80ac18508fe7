//! The viewer session: one state object, one reducer.
//!
//! All state of the flash-card viewer lives in [ViewerSession] and only changes through
//! [ViewerSession::apply]. Every input change recomputes the visible list synchronously, then
//! gives the deferred navigation a chance to resolve, then places the cursor and prunes
//! per-card state. Keeping that ordering in one place is what makes suggestion navigation
//! land on the right class after the search term is cleared.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    cards::{CardUiState, DetailSection},
    class::{Category, ClassId, OntologyClass},
    config::DeckConfig,
    error::DeckError,
    event::{Effect, ViewerEvent},
    history::NavigationHistory,
    keys::{map_key, map_wheel, KeyDisposition, KeyInput},
    query::{self, compute_visible, index_of, DeckStats, ViewQuery},
    repository::{ClassRepository, LoadCause, LoadTicket, Mutation},
    resolver::{DeferredNavigation, Resolution},
    siblings::{self, Direction},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Single,
    Grid,
}

/// Why nothing can be shown. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placeholder {
    NoSource,
    Loading,
    NoMatches,
}

/// Type-ahead dropdown under the search box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionBox {
    pub items: Vec<Arc<OntologyClass>>,
    pub selected: Option<usize>,
    pub open: bool,
}

/// Where to put the cursor after a recomputation that did not resolve a pending navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Placement {
    Reset,
    Keep(Option<ClassId>),
    Index(usize),
}

/// Serializable view of the session for UI layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub source: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub placeholder: Option<Placeholder>,
    pub query: ViewQuery,
    pub view_mode: ViewMode,
    pub current_index: usize,
    pub visible_len: usize,
    pub current: Option<OntologyClass>,
    pub current_flipped: bool,
    pub expanded: Vec<DetailSection>,
    pub parent: Option<String>,
    pub sibling_count: usize,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub pending_navigation: Option<ClassId>,
    pub suggestions: Vec<(ClassId, String)>,
    pub selected_suggestion: Option<usize>,
    pub suggestions_open: bool,
}

#[derive(Debug, Clone)]
pub struct ViewerSession {
    repository: ClassRepository,
    query: ViewQuery,
    visible: Vec<Arc<OntologyClass>>,
    current_index: usize,
    view_mode: ViewMode,
    history: NavigationHistory,
    pending: DeferredNavigation,
    cards: CardUiState,
    suggestions: SuggestionBox,
    suggestion_limit: usize,
    error: Option<String>,
    rng: StdRng,
}

impl Default for ViewerSession {
    fn default() -> Self {
        ViewerSession::new(&DeckConfig::default())
    }
}

fn entropy_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(e) => {
            tracing::warn!("[ViewerSession] no entropy available ({e}), shuffle order is fixed");
            0
        }
    }
}

impl ViewerSession {
    pub fn new(config: &DeckConfig) -> ViewerSession {
        ViewerSession::with_seed(config, entropy_seed())
    }

    /// Session with a deterministic shuffle/random sequence.
    pub fn with_seed(config: &DeckConfig, seed: u64) -> ViewerSession {
        ViewerSession {
            repository: ClassRepository::default(),
            query: ViewQuery {
                sort: config.sort,
                shuffle: config.shuffle,
                ..Default::default()
            },
            visible: Vec::new(),
            current_index: 0,
            view_mode: config.view_mode,
            history: NavigationHistory::new(),
            pending: DeferredNavigation::default(),
            cards: CardUiState::default(),
            suggestions: SuggestionBox::default(),
            suggestion_limit: config.suggestion_limit,
            error: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn repository(&self) -> &ClassRepository {
        &self.repository
    }

    pub fn source(&self) -> Option<&str> {
        self.repository.source()
    }

    pub fn is_loading(&self) -> bool {
        self.repository.is_loading()
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn visible(&self) -> &[Arc<OntologyClass>] {
        &self.visible
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&Arc<OntologyClass>> {
        self.visible.get(self.current_index)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn pending_navigation(&self) -> Option<&ClassId> {
        self.pending.pending()
    }

    pub fn cards(&self) -> &CardUiState {
        &self.cards
    }

    pub fn suggestions(&self) -> &SuggestionBox {
        &self.suggestions
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_is_flipped(&self) -> bool {
        self.current()
            .is_some_and(|c| self.cards.is_flipped(&c.id))
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        if self.repository.source().is_none() {
            Some(Placeholder::NoSource)
        } else if self.repository.is_loading() {
            Some(Placeholder::Loading)
        } else if self.visible.is_empty() {
            Some(Placeholder::NoMatches)
        } else {
            None
        }
    }

    pub fn stats(&self) -> Option<DeckStats> {
        DeckStats::compute(&self.visible)
    }

    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        query::category_counts(&self.visible)
    }

    pub fn categories(&self) -> Vec<Category> {
        query::categories(self.repository.classes())
    }

    pub fn root_classes(&self) -> Vec<String> {
        query::root_classes(self.repository.classes())
    }

    pub fn current_parent(&self) -> Option<&str> {
        self.current().and_then(|c| siblings::parent_of(c))
    }

    pub fn current_siblings(&self) -> Vec<Arc<OntologyClass>> {
        self.current()
            .map(|c| siblings::siblings_of(c, &self.visible))
            .unwrap_or_default()
    }

    /// Resolves the disposition of a key press without applying it. UI layers use this to
    /// decide whether to prevent the browser default.
    pub fn key_disposition(&self, input: &KeyInput) -> KeyDisposition {
        map_key(input, self.current_is_flipped())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let current = self.current();
        SessionSnapshot {
            source: self.repository.source().map(str::to_string),
            loading: self.repository.is_loading(),
            error: self.error.clone(),
            placeholder: self.placeholder(),
            query: self.query.clone(),
            view_mode: self.view_mode,
            current_index: self.current_index,
            visible_len: self.visible.len(),
            current: current.map(|c| (**c).clone()),
            current_flipped: self.current_is_flipped(),
            expanded: current
                .map(|c| self.cards.expanded_sections(&c.id).iter().collect())
                .unwrap_or_default(),
            parent: self.current_parent().map(str::to_string),
            sibling_count: self.current_siblings().len(),
            can_go_back: self.history.can_go_back(),
            can_go_forward: self.history.can_go_forward(),
            pending_navigation: self.pending.pending().cloned(),
            suggestions: self
                .suggestions
                .items
                .iter()
                .map(|c| (c.id.clone(), c.label.clone()))
                .collect(),
            selected_suggestion: self.suggestions.selected,
            suggestions_open: self.suggestions.open,
        }
    }

    /// Applies one event and returns the work the caller must carry out.
    pub fn apply(&mut self, event: ViewerEvent) -> Vec<Effect> {
        tracing::trace!("[ViewerSession] apply {event}");
        match event {
            ViewerEvent::SelectSource(source) => self.select_source(source),
            ViewerEvent::Refresh => match self.repository.source().map(str::to_string) {
                Some(source) => vec![Effect::Load(
                    self.repository.begin_load(&source, LoadCause::Refresh),
                )],
                None => Vec::new(),
            },
            ViewerEvent::LoadCompleted { ticket, result } => self.complete_load(ticket, result),
            ViewerEvent::MutationSucceeded(mutation) => self.mutation_succeeded(mutation),
            ViewerEvent::MutationFailed { mutation, message } => {
                tracing::error!("[ViewerSession] {:?} rejected: {message}", mutation);
                self.error = Some(format!("{}: {message}", mutation.failure_prefix()));
                Vec::new()
            }
            ViewerEvent::ReportError(message) => {
                self.error = Some(message);
                Vec::new()
            }
            ViewerEvent::DismissError => {
                self.error = None;
                Vec::new()
            }

            ViewerEvent::SearchChanged(term) => {
                self.suggestions = if term.is_empty() {
                    SuggestionBox::default()
                } else {
                    SuggestionBox {
                        items: query::suggestions(
                            self.repository.classes(),
                            &term,
                            self.suggestion_limit,
                        ),
                        selected: None,
                        open: true,
                    }
                };
                self.query.search = term;
                self.recompute(Placement::Reset)
            }
            ViewerEvent::CategoryFilterChanged(facet) => {
                self.query.category = facet;
                self.recompute(Placement::Reset)
            }
            ViewerEvent::RootFilterChanged(facet) => {
                self.query.root = facet;
                self.recompute(Placement::Reset)
            }
            ViewerEvent::SortChanged(sort) => {
                self.query.sort = sort;
                self.recompute(Placement::Reset)
            }
            ViewerEvent::ShuffleToggled => {
                self.query.shuffle = !self.query.shuffle;
                self.recompute(Placement::Reset)
            }
            ViewerEvent::SetShuffle(shuffle) => {
                self.query.shuffle = shuffle;
                self.recompute(Placement::Reset)
            }
            ViewerEvent::ViewModeToggled => {
                self.view_mode = match self.view_mode {
                    ViewMode::Single => ViewMode::Grid,
                    ViewMode::Grid => ViewMode::Single,
                };
                self.sync_mounted();
                Vec::new()
            }
            ViewerEvent::SetViewMode(mode) => {
                self.view_mode = mode;
                self.sync_mounted();
                Vec::new()
            }

            ViewerEvent::SuggestionMove(direction) => {
                self.move_suggestion(direction);
                Vec::new()
            }
            ViewerEvent::SuggestionAccept => {
                let index = self.suggestions.selected.unwrap_or(0);
                match self.suggestions.items.get(index).map(|c| c.id.clone()) {
                    Some(id) => self.pick_suggestion(id),
                    None => Vec::new(),
                }
            }
            ViewerEvent::SuggestionPicked(id) => self.pick_suggestion(id),
            ViewerEvent::SuggestionDismiss => {
                self.suggestions.open = false;
                Vec::new()
            }

            ViewerEvent::JumpTo(index) => self.commit_jump(index),
            ViewerEvent::NavigateToName(name) => match query::find_by_name(&self.visible, &name) {
                Some(index) => self.commit_jump(index),
                None => {
                    tracing::debug!("[ViewerSession] no visible class named {name:?}");
                    Vec::new()
                }
            },
            ViewerEvent::Back => {
                let target = self.history.back();
                self.move_to_history_entry(target);
                Vec::new()
            }
            ViewerEvent::Forward => {
                let target = self.history.forward();
                self.move_to_history_entry(target);
                Vec::new()
            }
            ViewerEvent::Sibling(direction) => self.navigate_sibling(direction),
            ViewerEvent::Wheel { delta_y } => {
                match map_wheel(delta_y, self.current_is_flipped()) {
                    Some(direction) => self.navigate_sibling(direction),
                    None => Vec::new(),
                }
            }
            ViewerEvent::Random => {
                if !self.visible.is_empty() {
                    self.current_index = self.rng.random_range(0..self.visible.len());
                    self.sync_mounted();
                }
                Vec::new()
            }

            ViewerEvent::ToggleFlip(id) => {
                self.cards.toggle_flip(&id);
                Vec::new()
            }
            ViewerEvent::FlipCurrent => {
                if let Some(id) = self.current().map(|c| c.id.clone()) {
                    self.cards.toggle_flip(&id);
                }
                Vec::new()
            }
            ViewerEvent::ToggleSection(id, section) => {
                self.cards.toggle_section(&id, section);
                Vec::new()
            }

            ViewerEvent::Key(input) => match self.key_disposition(&input) {
                KeyDisposition::Handled(event) => self.apply(event),
                KeyDisposition::PassThrough => Vec::new(),
            },
        }
    }

    fn select_source(&mut self, source: String) -> Vec<Effect> {
        if source.is_empty() {
            self.repository.clear();
            self.cards.clear();
            self.pending.cancel();
            self.visible.clear();
            self.current_index = 0;
            return Vec::new();
        }
        self.error = None;
        vec![Effect::Load(
            self.repository.begin_load(&source, LoadCause::Select),
        )]
    }

    fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<OntologyClass>, DeckError>,
    ) -> Vec<Effect> {
        let current_id = self.current().map(|c| c.id.clone());
        match result {
            Ok(classes) => {
                if self.repository.complete(&ticket, classes).is_err() {
                    return Vec::new();
                }
            }
            Err(e) => {
                if self.repository.fail(&ticket).is_err() {
                    return Vec::new();
                }
                tracing::error!(
                    "[ViewerSession] error loading classes for '{}': {e}",
                    ticket.source
                );
                self.error = Some(format!("Failed to load ontology classes: {}", e.detail()));
            }
        }

        let placement = match ticket.cause {
            LoadCause::Select => {
                self.cards.clear();
                Placement::Reset
            }
            LoadCause::Refresh => Placement::Keep(current_id),
            LoadCause::Mutation {
                mutation: Mutation::DeleteNode { id },
                index,
                len,
            } => {
                if current_id.as_ref() != Some(&id) {
                    Placement::Keep(current_id)
                } else if index + 1 >= len {
                    Placement::Index(len.saturating_sub(2))
                } else {
                    Placement::Index(index)
                }
            }
            LoadCause::Mutation { .. } => Placement::Keep(current_id),
        };
        let classes = self.repository.classes();
        self.cards.retain_existing(classes.iter().map(|c| &c.id));
        self.recompute(placement)
    }

    fn mutation_succeeded(&mut self, mutation: Mutation) -> Vec<Effect> {
        let Some(source) = self.repository.source().map(str::to_string) else {
            self.error = Some(DeckError::NoSourceSelected.to_string());
            return Vec::new();
        };
        self.error = None;
        let cause = LoadCause::Mutation {
            mutation,
            index: self.current_index,
            len: self.visible.len(),
        };
        vec![Effect::Load(self.repository.begin_load(&source, cause))]
    }

    /// Reruns the view pipeline and re-establishes the cursor invariant.
    fn recompute(&mut self, placement: Placement) -> Vec<Effect> {
        self.visible = compute_visible(self.repository.classes(), &self.query, &mut self.rng);

        let mut effects = Vec::new();
        let resolved = match self.pending.on_recompute(&self.visible) {
            Some(Resolution::Resolved { index, .. }) => {
                effects.extend(self.commit_jump(index));
                true
            }
            Some(Resolution::Missed { id }) => {
                tracing::warn!("[Search] Could not find class in filtered list: {id}");
                false
            }
            None => false,
        };

        if !resolved {
            self.current_index = match placement {
                Placement::Reset => 0,
                Placement::Keep(Some(id)) => {
                    index_of(&self.visible, &id).unwrap_or(self.current_index)
                }
                Placement::Keep(None) => self.current_index,
                Placement::Index(index) => index,
            };
        }
        self.clamp_index();
        self.sync_mounted();
        effects
    }

    fn clamp_index(&mut self) {
        if self.visible.is_empty() {
            self.current_index = 0;
        } else if self.current_index >= self.visible.len() {
            self.current_index = self.visible.len() - 1;
        }
    }

    /// History-recording jump to a visible position. Out-of-range positions are ignored.
    fn commit_jump(&mut self, index: usize) -> Vec<Effect> {
        let Some(id) = self.visible.get(index).map(|c| c.id.clone()) else {
            return Vec::new();
        };
        self.view_mode = ViewMode::Single;
        self.current_index = index;
        self.history.commit(id);
        self.sync_mounted();
        vec![Effect::ScrollToTop]
    }

    fn move_to_history_entry(&mut self, target: Option<ClassId>) {
        let Some(id) = target else {
            return;
        };
        match index_of(&self.visible, &id) {
            Some(index) => {
                self.current_index = index;
                self.sync_mounted();
            }
            None => tracing::debug!("[ViewerSession] history entry {id} is not visible"),
        }
    }

    fn navigate_sibling(&mut self, direction: Direction) -> Vec<Effect> {
        let Some(current) = self.current().cloned() else {
            return Vec::new();
        };
        let Some(target) = siblings::next_sibling(&current, &self.visible, direction) else {
            return Vec::new();
        };
        match index_of(&self.visible, &target.id) {
            Some(index) => self.commit_jump(index),
            None => Vec::new(),
        }
    }

    fn move_suggestion(&mut self, direction: Direction) {
        let len = self.suggestions.items.len();
        if !self.suggestions.open || len == 0 {
            return;
        }
        self.suggestions.selected = match (direction, self.suggestions.selected) {
            (Direction::Next, None) => Some(0),
            (Direction::Next, Some(i)) => Some((i + 1).min(len - 1)),
            (Direction::Previous, Some(i)) if i > 0 => Some(i - 1),
            (Direction::Previous, _) => None,
        };
    }

    fn pick_suggestion(&mut self, id: ClassId) -> Vec<Effect> {
        tracing::debug!("[Search] navigating to suggestion {id}");
        self.suggestions = SuggestionBox::default();
        self.pending.arm(id);
        self.query.search.clear();
        self.recompute(Placement::Reset)
    }

    /// Expansion state only lives as long as its card is rendered: the current card in
    /// single view, every visible card in grid view.
    fn sync_mounted(&mut self) {
        match self.view_mode {
            ViewMode::Single => {
                let current = self.visible.get(self.current_index).map(|c| &c.id);
                self.cards.retain_mounted(current);
            }
            ViewMode::Grid => {
                self.cards.retain_mounted(self.visible.iter().map(|c| &c.id));
            }
        }
    }
}
