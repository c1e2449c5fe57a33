//! Overlays, their display settings and the context tying them to a view.

mod context;
mod display;
mod kind;
pub mod opts;
mod overlay;

pub use context::DisplayContext;
pub use display::Display;
pub use kind::{OptionKind, OverlayType};
pub use overlay::{Intent, Overlay, OverlayData, OverlayId};
