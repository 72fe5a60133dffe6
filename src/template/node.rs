//! Pre-lexed body representation for templates and blocks
//!
//! Bodies arrive already lexed: a flat sequence of nodes where nested blocks
//! appear only as [`Node::Block`] placeholders. The definitions behind those
//! placeholders live in the registry.

use std::fmt;

/// Dotted lookup path into the page data, e.g. `page.meta.title`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath(Vec<String>);

impl DataPath {
    /// Parse a dotted path. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for DataPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// A single instruction in a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal markup, emitted as-is
    Text(String),
    /// A named region; resolved through the override chain
    Block(String),
    /// Render the next-most-derived definition of the executing block
    Parent,
    /// Page-data output
    Var { path: DataPath, escape: bool },
    /// Opaque extension point, replaced by whatever the dispatcher returns
    Hook(String),
    /// Render another template's root body with the same override chain
    Include(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn block(name: impl Into<String>) -> Self {
        Node::Block(name.into())
    }

    /// Escaped page-data output
    pub fn var(path: &str) -> Self {
        Node::Var {
            path: DataPath::parse(path),
            escape: true,
        }
    }

    /// Unescaped page-data output
    pub fn raw(path: &str) -> Self {
        Node::Var {
            path: DataPath::parse(path),
            escape: false,
        }
    }

    pub fn hook(name: impl Into<String>) -> Self {
        Node::Hook(name.into())
    }

    pub fn include(template: impl Into<String>) -> Self {
        Node::Include(template.into())
    }
}

/// Ordered sequence of nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body(Vec<Node>);

impl Body {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self(nodes)
    }

    /// Body consisting of a single text node
    pub fn text(text: impl Into<String>) -> Self {
        Self(vec![Node::Text(text.into())])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of all region placeholders, in order of appearance
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|n| match n {
            Node::Block(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Templates pulled in by `Include` nodes, in order of appearance
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|n| match n {
            Node::Include(id) => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn calls_parent(&self) -> bool {
        self.0.iter().any(|n| matches!(n, Node::Parent))
    }
}

impl From<Vec<Node>> for Body {
    fn from(nodes: Vec<Node>) -> Self {
        Self(nodes)
    }
}

impl FromIterator<Node> for Body {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
