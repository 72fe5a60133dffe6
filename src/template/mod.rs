//! Template inheritance: block registry, body model and override resolution
//!
//! A base layout declares named regions ("blocks"). Templates that extend it
//! override or extend any block, including blocks nested inside other blocks.
//! The resolver turns a chain of templates into one override chain per block
//! name, most-derived definition first.
//!
//! # Example
//!
//! ```rust
//! use block_composer::template::{build_chain, template_chain, Body, Node, TemplateRegistry};
//!
//! let mut registry = TemplateRegistry::new();
//! registry
//!     .declare_template("layout", None, vec![Node::block("content")].into())
//!     .unwrap();
//! registry.register("layout", "content", Body::text("Hello"), vec![]).unwrap();
//! registry
//!     .declare_template("page", Some("layout".to_string()), Body::default())
//!     .unwrap();
//! registry.register("page", "content", Body::text("Custom"), vec![]).unwrap();
//!
//! let templates = template_chain(&registry, "page").unwrap();
//! let chain = build_chain(&registry, &templates).unwrap();
//! assert_eq!(chain.owners("content"), vec!["page", "layout"]);
//! ```

mod node;
mod registry;
mod resolver;

pub use node::{Body, DataPath, Node};
pub use registry::{BlockDefinition, BlockMode, RegistryError, TemplateEntry, TemplateRegistry};
pub use resolver::{
    build_chain, template_chain, BlockSlot, OverrideChain, ResolveError, SkippedOverride,
    TemplateChain,
};
