//! WASM bindings for the flash-card viewer
//!
//! The page owns all network access. The viewer tells it what to fetch through the effects
//! returned from each call, and the page reports back with `finishLoad`/`failLoad`.
//!
//! ## Usage
//!
//! ```javascript,ignore
//! import init, { DeckViewer } from './ontodeck_core.js';
//!
//! await init();
//! const viewer = new DeckViewer(null);
//!
//! async function run(effects) {
//!     for (const effect of effects) {
//!         if (effect.Load) {
//!             const ticket = effect.Load;
//!             const resp = await fetch(`/api/classes/${ticket.source}`);
//!             const next = resp.ok
//!                 ? viewer.finishLoad(ticket, await resp.text())
//!                 : viewer.failLoad(ticket, resp.status, await resp.text());
//!             await run(next);
//!         } else if (effect === 'ScrollToTop') {
//!             window.scrollTo(0, 0);
//!         }
//!     }
//!     render(viewer.snapshot());
//! }
//!
//! await run(viewer.selectSource('clinical.owl'));
//! ```
//!
//! Everything returned crosses the boundary through the JSON-compatible serializer, so maps
//! arrive as plain objects rather than `Map`s.

use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::{
    class::OntologyClass,
    config::DeckConfig,
    error::DeckError,
    event::ViewerEvent,
    keys::{Key, KeyDisposition, KeyInput},
    repository::{LoadTicket, Mutation},
    session::ViewerSession,
};

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| js_error(DeckError::from(e)))
}

fn js_error(e: DeckError) -> JsValue {
    let msg = e.to_string();
    console::error_1(&msg.clone().into());
    JsValue::from_str(&msg)
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(DeckError::from(e)))
}

/// Routes `tracing` output to the browser console. Safe to call more than once.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    tracing_wasm::try_set_as_global_default().ok();
}

#[wasm_bindgen]
pub struct DeckViewer {
    session: ViewerSession,
}

#[wasm_bindgen]
impl DeckViewer {
    /// `config` is an optional TOML document with viewer preferences.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<DeckViewer, JsValue> {
        let config = match config {
            Some(toml) => DeckConfig::from_toml_str(&toml).map_err(js_error)?,
            None => DeckConfig::default(),
        };
        Ok(DeckViewer {
            session: ViewerSession::new(&config),
        })
    }

    /// Applies a JSON-shaped `ViewerEvent` and returns the resulting effects.
    pub fn dispatch(&mut self, event: JsValue) -> Result<JsValue, JsValue> {
        let event: ViewerEvent = from_js(event)?;
        to_js(&self.session.apply(event))
    }

    #[wasm_bindgen(js_name = selectSource)]
    pub fn select_source(&mut self, filename: String) -> Result<JsValue, JsValue> {
        to_js(&self.session.apply(ViewerEvent::SelectSource(filename)))
    }

    pub fn refresh(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.session.apply(ViewerEvent::Refresh))
    }

    /// Answers a `Load` effect with the response body, a JSON array of classes.
    #[wasm_bindgen(js_name = finishLoad)]
    pub fn finish_load(&mut self, ticket: JsValue, body: String) -> Result<JsValue, JsValue> {
        let ticket: LoadTicket = from_js(ticket)?;
        let result = serde_json::from_str::<Vec<OntologyClass>>(&body).map_err(DeckError::from);
        to_js(&self.session.apply(ViewerEvent::LoadCompleted { ticket, result }))
    }

    /// Answers a `Load` effect with an HTTP failure.
    #[wasm_bindgen(js_name = failLoad)]
    pub fn fail_load(
        &mut self,
        ticket: JsValue,
        status: u16,
        detail: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let ticket: LoadTicket = from_js(ticket)?;
        let error = status_error(status, detail.as_deref());
        to_js(&self.session.apply(ViewerEvent::LoadCompleted {
            ticket,
            result: Err(error),
        }))
    }

    #[wasm_bindgen(js_name = mutationSucceeded)]
    pub fn mutation_succeeded(&mut self, mutation: JsValue) -> Result<JsValue, JsValue> {
        let mutation: Mutation = from_js(mutation)?;
        to_js(&self.session.apply(ViewerEvent::MutationSucceeded(mutation)))
    }

    #[wasm_bindgen(js_name = mutationFailed)]
    pub fn mutation_failed(
        &mut self,
        mutation: JsValue,
        status: u16,
        detail: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let mutation: Mutation = from_js(mutation)?;
        let message = status_error(status, detail.as_deref()).detail();
        to_js(&self.session.apply(ViewerEvent::MutationFailed { mutation, message }))
    }

    /// Handles a `keydown`. Returns `true` when the page should call `preventDefault()`.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: String, in_text_input: bool) -> bool {
        let input = KeyInput {
            key: Key::from_dom(&key),
            in_text_input,
        };
        match self.session.key_disposition(&input) {
            KeyDisposition::Handled(event) => {
                self.session.apply(event);
                true
            }
            KeyDisposition::PassThrough => false,
        }
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.snapshot())
    }

    /// Visible classes, in display order.
    pub fn visible(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.visible())
    }

    pub fn stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.stats())
    }

    #[wasm_bindgen(js_name = categoryCounts)]
    pub fn category_counts(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.category_counts())
    }

    pub fn categories(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.categories())
    }

    #[wasm_bindgen(js_name = rootClasses)]
    pub fn root_classes(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.root_classes())
    }
}

fn status_error(status: u16, detail: Option<&str>) -> DeckError {
    match http::StatusCode::from_u16(status) {
        Ok(status) => DeckError::from_status(status, detail),
        Err(_) => DeckError::Service(
            detail
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}")),
        ),
    }
}
