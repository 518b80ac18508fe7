//! # ontodeck-core
//!
//! The navigation, filtering and history engine behind a flash-card viewer for ontology
//! classes.
//!
//! ## Overview
//!
//! An ontology file (OWL, extracted into class records by some backend) is presented as a deck
//! of cards, one per class. The participant searches, filters by category or root class,
//! sorts, shuffles, flips cards to see hierarchy details, and moves through the deck by
//! position, by sibling, by random jump or through browser-style back/forward history.
//!
//! ontodeck-core owns all of that state and none of the rendering. A UI layer (the `wasm`
//! bindings, or anything else) feeds it [event::ViewerEvent]s and renders from
//! [session::ViewerSession] or its [session::SessionSnapshot].
//!
//! ### Key Features
//!
//! - **Single reducer**: every state change goes through [session::ViewerSession::apply]
//! - **Deterministic pipeline**: filter, sort and shuffle are pure functions of their inputs and
//!   an injected random source
//! - **Deferred navigation**: picking a search suggestion lands on the class after the search
//!   term has been cleared and the list recomputed
//! - **Stale-load protection**: loads carry a generation number, late answers are dropped
//! - **Id-keyed card state**: flips survive filtering and re-sorting
//!
//! ## Architecture
//!
//! - **[`class`]**: Class records, categories, integrity checks
//! - **[`query`]**: The view pipeline (search, facets, sort keys, shuffle, suggestions)
//! - **[`history`]**: Back/forward history of visited classes
//! - **[`siblings`]**: Parent/sibling relations
//! - **[`resolver`]**: One-shot navigation requests resolved after recomputation
//! - **[`cards`]**: Per-card flip and expansion state
//! - **[`repository`]**: The raw class list and load tickets
//! - **[`session`]**: The viewer state and its reducer
//! - **[`source`]**: Where classes come from, and edits on them
//! - **[`viewer`]**: Async driver tying a session to a source
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ontodeck_core::{
//!     config::DeckConfig,
//!     event::ViewerEvent,
//!     source::JsonDirSource,
//!     viewer::Viewer,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let viewer = Viewer::new(JsonDirSource::new("./ontologies"), &DeckConfig::default());
//!
//!     // Lists `*.json` class dumps and loads the first one
//!     viewer.list_sources().await?;
//!
//!     viewer.dispatch(ViewerEvent::SearchChanged("fever".to_string())).await;
//!     viewer.dispatch(ViewerEvent::SuggestionAccept).await;
//!
//!     let snapshot = viewer.snapshot();
//!     if let Some(class) = snapshot.current {
//!         println!("{} ({} of {})", class.label, snapshot.current_index + 1, snapshot.visible_len);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `bin`: the `ontodeck` command line tool
//! - `wasm`: browser bindings ([`wasm::DeckViewer`])

pub mod cards;
pub mod class;
pub mod config;
pub mod error;
pub mod event;
pub mod history;
pub mod keys;
pub mod query;
pub mod repository;
pub mod resolver;
pub mod session;
pub mod siblings;
pub mod source;
pub mod viewer;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::*;
