//! Block registry for storing templates and their block definitions

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::node::Body;

/// Errors that can occur while registering templates and blocks
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Same top-level block declared twice in one template, or the same
    /// sub-block declared twice under one enclosing block
    #[error("duplicate block '{name}' in template '{template}'{}", enclosing_suffix(.enclosing))]
    DuplicateBlock {
        template: String,
        name: String,
        enclosing: Option<String>,
    },

    /// Template declared twice
    #[error("duplicate template definition: {id}")]
    DuplicateTemplate { id: String },

    /// Template not declared
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    /// Sub-block registered under a block that does not list it
    #[error("block '{enclosing}' in template '{template}' does not declare sub-block '{name}'")]
    UndeclaredSubBlock {
        template: String,
        enclosing: String,
        name: String,
    },
}

fn enclosing_suffix(enclosing: &Option<String>) -> String {
    match enclosing {
        Some(parent) => format!(" (inside '{}')", parent),
        None => String::new(),
    }
}

/// How a definition combines with the definition it overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockMode {
    /// Own body only; the parent renders only through an explicit `Parent` node
    #[default]
    Replace,
    /// Parent content first, then own body
    Append,
    /// Own body first, then parent content
    Prepend,
}

/// A named block implementation declared by one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDefinition {
    /// Block name
    pub name: String,
    /// Declaring template; set on registration
    pub owner: String,
    /// Lexically enclosing blocks, outermost first; empty for top-level blocks
    pub scope: Vec<String>,
    pub mode: BlockMode,
    pub body: Body,
    /// Names of sub-blocks declared inside this block, in order
    pub sub_blocks: Vec<String>,
}

impl BlockDefinition {
    /// Create a top-level definition in `Replace` mode
    pub fn new(name: impl Into<String>, body: impl Into<Body>) -> Self {
        Self {
            name: name.into(),
            owner: String::new(),
            scope: Vec::new(),
            mode: BlockMode::Replace,
            body: body.into(),
            sub_blocks: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: BlockMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sub_blocks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_blocks = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_nested(&self) -> bool {
        !self.scope.is_empty()
    }

    /// Immediately enclosing block, `None` for top-level blocks
    pub fn enclosing(&self) -> Option<&str> {
        self.scope.last().map(|s| s.as_str())
    }

    /// Scope that sub-blocks declared in this body live in
    pub fn path(&self) -> Vec<String> {
        let mut path = self.scope.clone();
        path.push(self.name.clone());
        path
    }

    /// Whether executing this definition also renders the one below it.
    ///
    /// True for append/prepend modes, an explicit `Parent` node, or a body
    /// that re-invokes its own name.
    pub fn extends_parent(&self) -> bool {
        self.mode != BlockMode::Replace
            || self.body.calls_parent()
            || self.body.regions().any(|r| r == self.name)
    }
}

/// A registered template: optional parent, root body and its blocks
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    id: String,
    parent: Option<String>,
    root: Body,
    /// All definitions, top-level and nested, in registration order
    definitions: Vec<Arc<BlockDefinition>>,
    top_level: HashMap<String, usize>,
    nested: HashMap<(Vec<String>, String), usize>,
}

impl TemplateEntry {
    fn new(id: String, parent: Option<String>, root: Body) -> Self {
        Self {
            id,
            parent,
            root,
            definitions: Vec::new(),
            top_level: HashMap::new(),
            nested: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn root(&self) -> &Body {
        &self.root
    }

    pub fn definitions(&self) -> &[Arc<BlockDefinition>] {
        &self.definitions
    }

    /// Definition at `path`: a top-level name followed by sub-block names
    fn find(&self, path: &[String]) -> Option<&BlockDefinition> {
        let (name, scope) = path.split_last()?;
        let idx = if scope.is_empty() {
            *self.top_level.get(name)?
        } else {
            *self.nested.get(&(scope.to_vec(), name.clone()))?
        };
        Some(&self.definitions[idx])
    }
}

/// Registry of templates for one compilation unit
#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, TemplateEntry>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a template with its optional parent and root body
    pub fn declare_template(
        &mut self,
        id: impl Into<String>,
        parent: Option<String>,
        root: Body,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if self.templates.contains_key(&id) {
            return Err(RegistryError::DuplicateTemplate { id });
        }
        self.templates
            .insert(id.clone(), TemplateEntry::new(id, parent, root));
        Ok(())
    }

    /// Register a top-level block
    pub fn register(
        &mut self,
        template: &str,
        name: impl Into<String>,
        body: impl Into<Body>,
        sub_blocks: Vec<String>,
    ) -> Result<(), RegistryError> {
        let def = BlockDefinition::new(name, body).with_sub_blocks(sub_blocks);
        self.register_definition(template, def)
    }

    /// Register a prebuilt top-level definition
    pub fn register_definition(
        &mut self,
        template: &str,
        mut def: BlockDefinition,
    ) -> Result<(), RegistryError> {
        let entry = self.entry_mut(template)?;
        if entry.top_level.contains_key(&def.name) {
            return Err(RegistryError::DuplicateBlock {
                template: template.to_string(),
                name: def.name,
                enclosing: None,
            });
        }

        def.owner = template.to_string();
        def.scope.clear();
        entry.top_level.insert(def.name.clone(), entry.definitions.len());
        entry.definitions.push(Arc::new(def));
        Ok(())
    }

    /// Register a sub-block declared inside the block at path `enclosing`
    /// (outermost block first).
    ///
    /// That exact enclosing definition must already be registered in the
    /// same template and list the sub-block's name. An empty path registers
    /// a top-level block.
    pub fn register_nested<S: AsRef<str>>(
        &mut self,
        template: &str,
        enclosing: &[S],
        mut def: BlockDefinition,
    ) -> Result<(), RegistryError> {
        let scope: Vec<String> = enclosing.iter().map(|s| s.as_ref().to_string()).collect();
        if scope.is_empty() {
            return self.register_definition(template, def);
        }
        let entry = self.entry_mut(template)?;

        let declared = entry
            .find(&scope)
            .is_some_and(|parent| parent.sub_blocks.iter().any(|s| *s == def.name));
        if !declared {
            return Err(RegistryError::UndeclaredSubBlock {
                template: template.to_string(),
                enclosing: scope.join("/"),
                name: def.name,
            });
        }

        let key = (scope, def.name.clone());
        if entry.nested.contains_key(&key) {
            return Err(RegistryError::DuplicateBlock {
                template: template.to_string(),
                name: def.name,
                enclosing: Some(key.0.join("/")),
            });
        }

        def.owner = template.to_string();
        def.scope = key.0.clone();
        entry.nested.insert(key, entry.definitions.len());
        entry.definitions.push(Arc::new(def));
        Ok(())
    }

    /// Get a top-level block declared by a template
    pub fn lookup(&self, template: &str, name: &str) -> Option<&BlockDefinition> {
        let entry = self.templates.get(template)?;
        let idx = *entry.top_level.get(name)?;
        Some(&entry.definitions[idx])
    }

    /// Get a sub-block declared inside the block at path `enclosing`
    pub fn lookup_nested<S: AsRef<str>>(
        &self,
        template: &str,
        enclosing: &[S],
        name: &str,
    ) -> Option<&BlockDefinition> {
        let mut path: Vec<String> = enclosing.iter().map(|s| s.as_ref().to_string()).collect();
        path.push(name.to_string());
        self.templates.get(template)?.find(&path)
    }

    /// Get a template by id
    pub fn get(&self, id: &str) -> Option<&TemplateEntry> {
        self.templates.get(id)
    }

    /// Check if a template exists
    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Get all template ids
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn entry_mut(&mut self, template: &str) -> Result<&mut TemplateEntry, RegistryError> {
        self.templates
            .get_mut(template)
            .ok_or_else(|| RegistryError::TemplateNotFound {
                id: template.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::node::Node;

    fn registry_with(ids: &[&str]) -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        for id in ids {
            registry
                .declare_template(*id, None, Body::default())
                .expect("Should declare");
        }
        registry
    }

    #[test]
    fn test_registry_register_and_lookup() {
        let mut registry = registry_with(&["layout"]);
        registry
            .register("layout", "content", Body::text("Hello"), vec![])
            .expect("Should register");

        let def = registry.lookup("layout", "content").expect("Should find block");
        assert_eq!(def.owner, "layout");
        assert_eq!(def.body, Body::text("Hello"));
        assert!(registry.lookup("layout", "footer").is_none());
        assert!(registry.lookup("missing", "content").is_none());
    }

    #[test]
    fn test_registry_duplicate_top_level_block() {
        let mut registry = registry_with(&["layout"]);
        registry
            .register("layout", "content", Body::text("a"), vec![])
            .expect("First register should succeed");
        let result = registry.register("layout", "content", Body::text("b"), vec![]);
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateBlock { enclosing: None, .. })
        ));
    }

    #[test]
    fn test_registry_same_name_in_other_template() {
        let mut registry = registry_with(&["layout", "page"]);
        registry
            .register("layout", "content", Body::text("a"), vec![])
            .expect("Should register");
        registry
            .register("page", "content", Body::text("b"), vec![])
            .expect("Other template has its own namespace");
    }

    #[test]
    fn test_registry_duplicate_template() {
        let mut registry = registry_with(&["layout"]);
        let result = registry.declare_template("layout", None, Body::default());
        assert!(matches!(result, Err(RegistryError::DuplicateTemplate { .. })));
    }

    #[test]
    fn test_registry_unknown_template() {
        let mut registry = TemplateRegistry::new();
        let result = registry.register("layout", "content", Body::default(), vec![]);
        assert!(matches!(result, Err(RegistryError::TemplateNotFound { .. })));
    }

    #[test]
    fn test_sub_blocks_namespaced_by_enclosing_block() {
        let mut registry = registry_with(&["layout"]);
        registry
            .register(
                "layout",
                "left_column",
                vec![Node::block("widget")],
                vec!["widget".to_string()],
            )
            .expect("Should register");
        registry
            .register(
                "layout",
                "right_column",
                vec![Node::block("widget")],
                vec!["widget".to_string()],
            )
            .expect("Should register");

        registry
            .register_nested("layout", &["left_column"], BlockDefinition::new("widget", Body::text("L")))
            .expect("Should register under left_column");
        registry
            .register_nested("layout", &["right_column"], BlockDefinition::new("widget", Body::text("R")))
            .expect("Same name under a different parent is distinct");

        let left = registry
            .lookup_nested("layout", &["left_column"], "widget")
            .expect("Should find");
        assert_eq!(left.enclosing(), Some("left_column"));
        assert_eq!(left.body, Body::text("L"));

        let result = registry.register_nested(
            "layout",
            &["left_column"],
            BlockDefinition::new("widget", Body::text("again")),
        );
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateBlock { enclosing: Some(_), .. })
        ));
    }

    #[test]
    fn test_nested_block_must_be_declared_by_enclosing() {
        let mut registry = registry_with(&["layout"]);
        registry
            .register("layout", "content_wrapper", Body::default(), vec![])
            .expect("Should register");
        let result = registry.register_nested(
            "layout",
            &["content_wrapper"],
            BlockDefinition::new("content", Body::default()),
        );
        assert!(matches!(result, Err(RegistryError::UndeclaredSubBlock { .. })));
    }

    #[test]
    fn test_sub_blocks_keyed_by_full_enclosing_path() {
        let mut registry = registry_with(&["layout"]);
        for column in ["left", "right"] {
            registry
                .register("layout", column, vec![Node::block("w")], vec!["w".to_string()])
                .expect("Should register");
            registry
                .register_nested(
                    "layout",
                    &[column],
                    BlockDefinition::new("w", vec![Node::block("x")]).with_sub_blocks(["x"]),
                )
                .expect("Should register w");
            registry
                .register_nested(
                    "layout",
                    &[column, "w"],
                    BlockDefinition::new("x", Body::text(column)),
                )
                .expect("Same middle name under another parent is distinct");
        }

        let right = registry
            .lookup_nested("layout", &["right", "w"], "x")
            .expect("Should find");
        assert_eq!(right.scope, vec!["right".to_string(), "w".to_string()]);
        assert_eq!(right.body, Body::text("right"));
        assert!(registry.lookup_nested("layout", &["w"], "x").is_none());

        let result = registry.register_nested(
            "layout",
            &["left", "w"],
            BlockDefinition::new("x", Body::default()),
        );
        assert_eq!(
            result,
            Err(RegistryError::DuplicateBlock {
                template: "layout".to_string(),
                name: "x".to_string(),
                enclosing: Some("left/w".to_string()),
            })
        );
    }

    #[test]
    fn test_sub_block_checked_against_exact_enclosing_definition() {
        let mut registry = registry_with(&["layout"]);
        registry
            .register("layout", "a", Body::default(), vec!["w".to_string()])
            .expect("Should register");
        registry
            .register("layout", "b", Body::default(), vec![])
            .expect("Should register");
        registry
            .register_nested("layout", &["a"], BlockDefinition::new("w", Body::default()))
            .expect("a declares w");

        let result = registry.register_nested(
            "layout",
            &["b"],
            BlockDefinition::new("w", Body::default()),
        );
        assert!(matches!(
            result,
            Err(RegistryError::UndeclaredSubBlock { enclosing, .. }) if enclosing == "b"
        ));
    }

    #[test]
    fn test_extends_parent() {
        let plain = BlockDefinition::new("content", Body::text("x"));
        assert!(!plain.extends_parent());

        let with_parent = BlockDefinition::new("content", vec![Node::Parent]);
        assert!(with_parent.extends_parent());

        let self_call = BlockDefinition::new("content", vec![Node::block("content")]);
        assert!(self_call.extends_parent());

        let append = BlockDefinition::new("content", Body::text("x")).with_mode(BlockMode::Append);
        assert!(append.extends_parent());
    }
}
