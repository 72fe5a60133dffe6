//! Block Composer - template inheritance and block composition
//!
//! A base layout declares named, overridable regions ("blocks"); templates
//! that extend it override or extend any of them, including blocks nested
//! inside other blocks. This library resolves which implementation runs for
//! each region and renders the result.
//!
//! # Example
//!
//! ```rust
//! use block_composer::data::EmptyData;
//! use block_composer::loader::Manifest;
//! use block_composer::render;
//!
//! let registry = Manifest::from_str(r#"
//!     [[template]]
//!     id = "layout"
//!     root = [{ text = "<main>" }, { block = "content" }, { text = "</main>" }]
//!
//!     [[template.block]]
//!     name = "content"
//!     body = [{ text = "Hello world!" }]
//!
//!     [[template]]
//!     id = "page"
//!     extends = "layout"
//! "#).unwrap().into_registry().unwrap();
//!
//! let html = render(&registry, "page", &EmptyData).unwrap();
//! assert_eq!(html, "<main>Hello world!</main>");
//! ```

pub mod data;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod render;
pub mod sanitize;
pub mod template;

pub use data::{DataAccessError, PageData};
pub use engine::Engine;
pub use error::LoadError;
pub use hooks::{HookDispatcher, HookRegistry};
pub use render::{RenderConfig, Renderer};
pub use sanitize::Sanitizer;
pub use template::{OverrideChain, ResolveError, TemplateChain, TemplateRegistry};

use thiserror::Error;

/// Errors that can occur during a render
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// Block or template resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Page data lookup failed
    #[error("page data error: {0}")]
    DataAccess(#[from] DataAccessError),

    /// Block nesting went past the configured limit
    #[error("maximum render depth {max_depth} exceeded at block '{block}'")]
    DepthExceeded { block: String, max_depth: usize },

    /// `Parent` reached outside of any block
    #[error("parent block requested outside of a block")]
    ParentOutsideBlock,

    /// Hook without a handler while strict hooks are on
    #[error("no handler for hook '{0}'")]
    UnknownHook(String),
}

/// Render the template `leaf` with default configuration
///
/// Builds the template chain and override chain, then renders the base
/// layout. Use [`Engine`] to reuse override chains across renders.
pub fn render(
    registry: &TemplateRegistry,
    leaf: &str,
    data: &dyn PageData,
) -> Result<String, RenderError> {
    render_with_config(registry, leaf, data, &RenderConfig::default())
}

/// Render the template `leaf` with custom configuration
///
/// # Example
///
/// ```rust
/// use block_composer::data::EmptyData;
/// use block_composer::template::{Body, Node, TemplateRegistry};
/// use block_composer::{render_with_config, RenderConfig, RenderError};
///
/// let mut registry = TemplateRegistry::new();
/// registry.declare_template("layout", None, vec![Node::block("a")].into()).unwrap();
/// registry.register("layout", "a", vec![Node::text("a"), Node::block("b")], vec![]).unwrap();
/// registry.register("layout", "b", vec![Node::block("a")], vec![]).unwrap();
///
/// let config = RenderConfig::new().with_max_depth(1);
/// let result = render_with_config(&registry, "layout", &EmptyData, &config);
/// assert!(matches!(result, Err(RenderError::DepthExceeded { .. })));
/// ```
pub fn render_with_config(
    registry: &TemplateRegistry,
    leaf: &str,
    data: &dyn PageData,
    config: &RenderConfig,
) -> Result<String, RenderError> {
    let templates = template::template_chain(registry, leaf)?;
    let chain = template::build_chain(registry, &templates)?;
    Renderer::new(&chain, config).render(data)
}
