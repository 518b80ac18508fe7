//! Keyboard and wheel shortcuts of the single-card view.
//!
//! | Key            | Action                        |
//! |----------------|-------------------------------|
//! | ArrowUp        | previous sibling              |
//! | ArrowDown      | next sibling                  |
//! | Space          | flip the current card         |
//! | R              | jump to a random class        |
//! | S              | toggle shuffle                |
//!
//! Nothing is handled while focus is inside a text input. Sibling navigation (arrows and
//! wheel) passes through while the current card is flipped so its back side can scroll.

use serde::{Deserialize, Serialize};

use crate::{event::ViewerEvent, siblings::Direction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Space,
    Char(char),
    Other(String),
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Key {
        match key {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            " " | "Spacebar" => Key::Space,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Other(other.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Key,
    /// Focus is in an `<input>` or `<textarea>`.
    #[serde(default)]
    pub in_text_input: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> KeyInput {
        KeyInput {
            key,
            in_text_input: false,
        }
    }
}

/// Whether the viewer consumes a key (and the browser default must be prevented).
#[derive(Debug, Clone, PartialEq)]
pub enum KeyDisposition {
    Handled(ViewerEvent),
    PassThrough,
}

pub fn map_key(input: &KeyInput, current_flipped: bool) -> KeyDisposition {
    if input.in_text_input {
        return KeyDisposition::PassThrough;
    }
    match &input.key {
        Key::ArrowUp if !current_flipped => {
            KeyDisposition::Handled(ViewerEvent::Sibling(Direction::Previous))
        }
        Key::ArrowDown if !current_flipped => {
            KeyDisposition::Handled(ViewerEvent::Sibling(Direction::Next))
        }
        Key::Space => KeyDisposition::Handled(ViewerEvent::FlipCurrent),
        Key::Char('r' | 'R') => KeyDisposition::Handled(ViewerEvent::Random),
        Key::Char('s' | 'S') => KeyDisposition::Handled(ViewerEvent::ShuffleToggled),
        _ => KeyDisposition::PassThrough,
    }
}

/// Scrolling down moves to the next sibling, up to the previous one.
pub fn map_wheel(delta_y: f64, current_flipped: bool) -> Option<Direction> {
    if current_flipped {
        return None;
    }
    if delta_y > 0.0 {
        Some(Direction::Next)
    } else if delta_y < 0.0 {
        Some(Direction::Previous)
    } else {
        None
    }
}
