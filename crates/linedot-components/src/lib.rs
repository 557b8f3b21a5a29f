//! # linedot-components
//!
//! Leptos components composing the line-dot visual on top of the shared
//! [`linedot_state::VisualStore`].

pub mod player;
pub mod visual;

pub use player::*;
pub use visual::*;
