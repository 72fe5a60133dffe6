//! Renderer for override chains
//!
//! This module walks the base layout's root body and, for every region it
//! reaches, executes the top-most definition at the current resolution
//! cursor.

pub mod config;
pub mod context;
pub mod dispatcher;

pub use config::RenderConfig;
pub use context::{CursorFrame, RenderContext};
pub use dispatcher::Renderer;
