//! Manifest loader for pre-lexed templates
//!
//! Template source text is compiled elsewhere; this module reads the
//! resulting block trees from TOML and fills a [`TemplateRegistry`].
//!
//! ```toml
//! [[template]]
//! id = "layout"
//! root = [{ text = "<main>" }, { block = "content" }, { text = "</main>" }]
//!
//! [[template.block]]
//! name = "content"
//! body = [{ text = "Hello world!" }]
//!
//! [[template]]
//! id = "page"
//! extends = "layout"
//!
//! [[template.block]]
//! name = "content"
//! mode = "append"
//! body = ["parent", { var = "page.meta.title" }]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;
use crate::template::{BlockDefinition, BlockMode, Body, Node, TemplateRegistry};

/// A set of templates ready to be registered
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub templates: Vec<TemplateSource>,
}

/// One template's block tree
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSource {
    pub id: String,
    pub extends: Option<String>,
    pub root: Body,
    pub blocks: Vec<BlockSource>,
}

/// A block and the sub-blocks declared inside it
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSource {
    pub name: String,
    pub mode: BlockMode,
    pub body: Body,
    pub blocks: Vec<BlockSource>,
}

/// TOML structure for deserializing manifests
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlManifest {
    #[serde(default, rename = "template")]
    templates: Vec<TomlTemplate>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlTemplate {
    id: String,
    extends: Option<String>,
    #[serde(default)]
    root: Vec<TomlNode>,
    #[serde(default, rename = "block")]
    blocks: Vec<TomlBlock>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlBlock {
    name: String,
    #[serde(default)]
    mode: TomlMode,
    #[serde(default)]
    body: Vec<TomlNode>,
    #[serde(default, rename = "block")]
    blocks: Vec<TomlBlock>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum TomlMode {
    #[default]
    Replace,
    Append,
    Prepend,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum TomlNode {
    Text(String),
    Block(String),
    Parent,
    Var(String),
    Raw(String),
    Hook(String),
    Include(String),
}

impl From<TomlNode> for Node {
    fn from(node: TomlNode) -> Self {
        match node {
            TomlNode::Text(text) => Node::Text(text),
            TomlNode::Block(name) => Node::Block(name),
            TomlNode::Parent => Node::Parent,
            TomlNode::Var(path) => Node::var(&path),
            TomlNode::Raw(path) => Node::raw(&path),
            TomlNode::Hook(name) => Node::Hook(name),
            TomlNode::Include(id) => Node::Include(id),
        }
    }
}

impl From<TomlMode> for BlockMode {
    fn from(mode: TomlMode) -> Self {
        match mode {
            TomlMode::Replace => BlockMode::Replace,
            TomlMode::Append => BlockMode::Append,
            TomlMode::Prepend => BlockMode::Prepend,
        }
    }
}

impl From<TomlBlock> for BlockSource {
    fn from(block: TomlBlock) -> Self {
        BlockSource {
            name: block.name,
            mode: block.mode.into(),
            body: block.body.into_iter().map(Node::from).collect(),
            blocks: block.blocks.into_iter().map(BlockSource::from).collect(),
        }
    }
}

impl Manifest {
    /// Load a manifest from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Load a manifest from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, LoadError> {
        let parsed: TomlManifest = toml::from_str(content)?;

        Ok(Manifest {
            templates: parsed
                .templates
                .into_iter()
                .map(|t| TemplateSource {
                    id: t.id,
                    extends: t.extends,
                    root: t.root.into_iter().map(Node::from).collect(),
                    blocks: t.blocks.into_iter().map(BlockSource::from).collect(),
                })
                .collect(),
        })
    }

    /// Register every template into a fresh registry
    pub fn into_registry(self) -> Result<TemplateRegistry, LoadError> {
        let mut registry = TemplateRegistry::new();
        self.register_into(&mut registry)?;
        Ok(registry)
    }

    /// Register every template into an existing registry
    pub fn register_into(self, registry: &mut TemplateRegistry) -> Result<(), LoadError> {
        for template in self.templates {
            registry.declare_template(&template.id, template.extends, template.root)?;
            for block in template.blocks {
                let nested = block_definition(block);
                registry.register_definition(&template.id, nested.definition)?;
                register_children(registry, &template.id, &[nested.name], nested.children)?;
            }
        }
        Ok(())
    }
}

struct Flattened {
    name: String,
    definition: BlockDefinition,
    children: Vec<BlockSource>,
}

fn block_definition(block: BlockSource) -> Flattened {
    let sub_blocks: Vec<String> = block.blocks.iter().map(|b| b.name.clone()).collect();
    Flattened {
        name: block.name.clone(),
        definition: BlockDefinition::new(block.name, block.body)
            .with_mode(block.mode)
            .with_sub_blocks(sub_blocks),
        children: block.blocks,
    }
}

/// Register `children` under the block at path `scope`, depth first
fn register_children(
    registry: &mut TemplateRegistry,
    template: &str,
    scope: &[String],
    children: Vec<BlockSource>,
) -> Result<(), LoadError> {
    for child in children {
        let nested = block_definition(child);
        registry.register_nested(template, scope, nested.definition)?;

        let mut inner = scope.to_vec();
        inner.push(nested.name);
        register_children(registry, template, &inner, nested.children)?;
    }
    Ok(())
}
