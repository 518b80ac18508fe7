use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{
    cards::DetailSection,
    class::{Category, ClassId, OntologyClass},
    error::DeckError,
    keys::KeyInput,
    query::{Facet, SortKey},
    repository::{LoadTicket, Mutation},
    session::ViewMode,
    siblings::Direction,
};

/// Everything that can happen to a [crate::session::ViewerSession]. Each variant is applied by
/// [crate::session::ViewerSession::apply], which returns the [Effect]s the caller has to carry
/// out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewerEvent {
    /// Choose a source file. An empty name deselects.
    SelectSource(String),
    /// Re-fetch the currently selected source.
    Refresh,
    /// Answer to an [Effect::Load].
    LoadCompleted {
        ticket: LoadTicket,
        result: Result<Vec<OntologyClass>, DeckError>,
    },
    /// The source accepted a mutation; the class list must be re-fetched.
    MutationSucceeded(Mutation),
    /// The source rejected a mutation. Local state stays as it was.
    MutationFailed { mutation: Mutation, message: String },
    /// Show an error message without changing any other state.
    ReportError(String),
    DismissError,

    SearchChanged(String),
    CategoryFilterChanged(Facet<Category>),
    RootFilterChanged(Facet<String>),
    SortChanged(SortKey),
    ShuffleToggled,
    SetShuffle(bool),
    ViewModeToggled,
    SetViewMode(ViewMode),

    /// Move the highlighted suggestion. `Next` is ArrowDown in the search box.
    SuggestionMove(Direction),
    /// Enter in the search box: take the highlighted suggestion, or the first one.
    SuggestionAccept,
    /// A suggestion was clicked.
    SuggestionPicked(ClassId),
    SuggestionDismiss,

    /// Jump to a position of the visible list, recording it in history.
    JumpTo(usize),
    /// Jump to a class named in a hierarchy list (label, id or local name).
    NavigateToName(String),
    Back,
    Forward,
    Sibling(Direction),
    /// Scroll wheel over the current card.
    Wheel { delta_y: f64 },
    /// Jump to a random visible class without recording history.
    Random,

    ToggleFlip(ClassId),
    FlipCurrent,
    ToggleSection(ClassId, DetailSection),

    Key(KeyInput),
}

impl Display for ViewerEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ViewerEvent::SelectSource(source) => write!(f, "SelectSource({source})"),
            ViewerEvent::LoadCompleted { ticket, result } => write!(
                f,
                "LoadCompleted(#{} {}, {})",
                ticket.generation,
                ticket.source,
                if result.is_ok() { "ok" } else { "err" }
            ),
            ViewerEvent::Key(input) => write!(f, "Key({:?})", input.key),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Work the session asks its driver to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Fetch the class list for the ticket's source and answer with
    /// [ViewerEvent::LoadCompleted].
    Load(LoadTicket),
    /// A committed jump happened; the content area should scroll back to the top.
    ScrollToTop,
}
