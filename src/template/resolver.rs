//! Inheritance resolution - builds per-name override chains for a template chain

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use super::node::Body;
use super::registry::{BlockDefinition, TemplateEntry, TemplateRegistry};

/// Errors raised while building or querying override chains
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Referenced block has no definition at or below the requested level
    #[error("unresolved block '{name}'{}", level_suffix(*.cursor))]
    UnresolvedBlock { name: String, cursor: usize },

    /// Template chain revisits a template
    #[error("cyclic template extension: {chain}")]
    CyclicExtension { chain: String },

    /// Templates include each other
    #[error("cyclic template include: {chain}")]
    CyclicInclude { chain: String },

    /// Include target that cannot take part in inheritance
    #[error("cannot include template '{template}': {reason}")]
    InvalidInclude { template: String, reason: String },

    /// Template missing from the registry
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },
}

fn level_suffix(cursor: usize) -> String {
    if cursor == 0 {
        String::new()
    } else {
        format!(" (no parent definition below level {})", cursor - 1)
    }
}

/// Linear sequence of template ids, most-derived first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateChain(Vec<String>);

impl TemplateChain {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    /// Most-derived template
    pub fn leaf(&self) -> Option<&str> {
        self.0.first().map(|s| s.as_str())
    }

    /// Least-derived template, the one whose root body is rendered
    pub fn base(&self) -> Option<&str> {
        self.0.last().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|t| t == id)
    }
}

impl fmt::Display for TemplateChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Where a region is filled: a block name plus the path of blocks it is
/// declared inside, outermost first. Top-level slots have an empty scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockSlot {
    pub scope: Vec<String>,
    pub name: String,
}

impl BlockSlot {
    pub fn new<I, S>(scope: I, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: scope.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    pub fn top(name: impl Into<String>) -> Self {
        Self {
            scope: Vec::new(),
            name: name.into(),
        }
    }

    pub fn is_top(&self) -> bool {
        self.scope.is_empty()
    }

    /// Whether `def` competes for this slot: top-level definitions of the
    /// name fill every slot, sub-blocks only their own.
    fn admits(&self, def: &BlockDefinition) -> bool {
        def.name == self.name && (def.scope.is_empty() || def.scope == self.scope)
    }
}

impl fmt::Display for BlockSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outer in &self.scope {
            write!(f, "{}/", outer)?;
        }
        write!(f, "{}", self.name)
    }
}

/// A nested override dropped because its enclosing block never executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOverride {
    pub name: String,
    pub owner: String,
    /// Path of the enclosing block, `/`-separated
    pub enclosing: String,
}

/// Resolved block implementations for one template chain
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideChain {
    templates: TemplateChain,
    root: Body,
    includes: BTreeMap<String, Body>,
    entries: BTreeMap<BlockSlot, Vec<Arc<BlockDefinition>>>,
    skipped: Vec<SkippedOverride>,
}

impl OverrideChain {
    pub fn templates(&self) -> &TemplateChain {
        &self.templates
    }

    /// Root body of the base template
    pub fn root(&self) -> &Body {
        &self.root
    }

    /// Root body of an included template
    pub fn include_root(&self, id: &str) -> Option<&Body> {
        self.includes.get(id)
    }

    /// Top-level definitions competing for `name`, most-derived first
    pub fn definitions(&self, name: &str) -> &[Arc<BlockDefinition>] {
        self.definitions_at(&BlockSlot::top(name))
    }

    /// Definitions competing for `slot`, most-derived first
    pub fn definitions_at(&self, slot: &BlockSlot) -> &[Arc<BlockDefinition>] {
        self.entries.get(slot).map(|d| d.as_slice()).unwrap_or(&[])
    }

    /// Declaring templates for top-level `name`, most-derived first
    pub fn owners(&self, name: &str) -> Vec<&str> {
        self.owners_at(&BlockSlot::top(name))
    }

    /// Declaring templates for `slot`, most-derived first
    pub fn owners_at(&self, slot: &BlockSlot) -> Vec<&str> {
        self.definitions_at(slot)
            .iter()
            .map(|d| d.owner.as_str())
            .collect()
    }

    pub fn slots(&self) -> impl Iterator<Item = &BlockSlot> {
        self.entries.keys()
    }

    /// Nested overrides left out because their enclosing block is replaced
    pub fn skipped(&self) -> &[SkippedOverride] {
        &self.skipped
    }

    /// Slot that region `name` fills inside a body declared at `scope`:
    /// the sub-block slot if any template declares one there, otherwise the
    /// top-level slot.
    pub fn slot_for<S: AsRef<str>>(&self, scope: &[S], name: &str) -> Option<&BlockSlot> {
        if !scope.is_empty() {
            let nested = BlockSlot::new(scope.iter().map(|s| s.as_ref()), name);
            if let Some((slot, _)) = self.entries.get_key_value(&nested) {
                return Some(slot);
            }
        }
        self.entries
            .get_key_value(&BlockSlot::top(name))
            .map(|(slot, _)| slot)
    }

    /// Return the first top-level definition of `name` at or after `cursor`
    pub fn resolve_top(
        &self,
        name: &str,
        cursor: usize,
    ) -> Result<&Arc<BlockDefinition>, ResolveError> {
        self.resolve_at(&BlockSlot::top(name), cursor)
    }

    /// Return the first definition for `slot` at or after `cursor`
    pub fn resolve_at(
        &self,
        slot: &BlockSlot,
        cursor: usize,
    ) -> Result<&Arc<BlockDefinition>, ResolveError> {
        let def = self
            .entries
            .get(slot)
            .and_then(|defs| defs.get(cursor))
            .ok_or_else(|| ResolveError::UnresolvedBlock {
                name: slot.name.clone(),
                cursor,
            })?;
        trace!(%slot, cursor, owner = %def.owner, "resolved block");
        Ok(def)
    }

    fn validate(&self) -> Result<(), ResolveError> {
        let unresolved = |name: &str, cursor: usize| ResolveError::UnresolvedBlock {
            name: name.to_string(),
            cursor,
        };

        for body in std::iter::once(&self.root).chain(self.includes.values()) {
            for region in body.regions() {
                if self.slot_for::<&str>(&[], region).is_none() {
                    return Err(unresolved(region, 0));
                }
            }
        }

        for (slot, defs) in &self.entries {
            // A top-level override of a sub-block finds its parent in the
            // sub-block's own slot
            let overrides_sub_block = slot.is_top()
                && self
                    .entries
                    .keys()
                    .any(|other| !other.is_top() && other.name == slot.name);
            for (idx, def) in live(defs).iter().enumerate() {
                if def.extends_parent() && idx + 1 >= defs.len() && !overrides_sub_block {
                    return Err(unresolved(&slot.name, idx + 1));
                }
                let scope = def.path();
                for region in def.body.regions() {
                    if region != def.name && self.slot_for(&scope, region).is_none() {
                        return Err(unresolved(region, 0));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Definitions that can execute: the prefix up to and including the first
/// one that does not render its parent.
fn live(defs: &[Arc<BlockDefinition>]) -> &[Arc<BlockDefinition>] {
    match defs.iter().position(|d| !d.extends_parent()) {
        Some(last) => &defs[..=last],
        None => defs,
    }
}

/// Follow parent links from `leaf` up to its base template
pub fn template_chain(registry: &TemplateRegistry, leaf: &str) -> Result<TemplateChain, ResolveError> {
    let mut ids: Vec<String> = Vec::new();
    let mut current = Some(leaf.to_string());

    while let Some(id) = current {
        if ids.contains(&id) {
            ids.push(id);
            return Err(ResolveError::CyclicExtension {
                chain: ids.join(" -> "),
            });
        }
        let entry = registry
            .get(&id)
            .ok_or_else(|| ResolveError::TemplateNotFound { id: id.clone() })?;
        current = entry.parent().map(str::to_string);
        ids.push(id);
    }

    Ok(TemplateChain(ids))
}

/// Build the override chain for a template chain.
///
/// Definitions are collected most-derived first, then those of included
/// templates, and grouped by [`BlockSlot`]. Sub-blocks under different
/// enclosing blocks get separate slots; a top-level definition joins every
/// slot of its name. Nested overrides whose enclosing block is fully
/// replaced by a more-derived template are dropped and reported through
/// [`OverrideChain::skipped`].
pub fn build_chain(
    registry: &TemplateRegistry,
    templates: &TemplateChain,
) -> Result<OverrideChain, ResolveError> {
    let mut entries_in_chain = Vec::with_capacity(templates.len());
    let mut seen = HashSet::new();
    for id in templates.ids() {
        if !seen.insert(id.as_str()) {
            return Err(ResolveError::CyclicExtension {
                chain: templates.to_string(),
            });
        }
        let entry = registry
            .get(id)
            .ok_or_else(|| ResolveError::TemplateNotFound { id: id.clone() })?;
        entries_in_chain.push(entry);
    }

    let base = entries_in_chain
        .last()
        .ok_or_else(|| ResolveError::TemplateNotFound {
            id: "<empty chain>".to_string(),
        })?;
    let root = base.root().clone();

    let included = collect_includes(registry, templates, &entries_in_chain)?;

    let candidates: Vec<Arc<BlockDefinition>> = entries_in_chain
        .iter()
        .chain(included.iter())
        .flat_map(|entry| entry.definitions().iter().cloned())
        .collect();
    let slots: BTreeSet<BlockSlot> = candidates
        .iter()
        .map(|def| BlockSlot::new(def.scope.iter().cloned(), def.name.clone()))
        .collect();

    let mut reach = Reachability::new(&candidates);
    let mut entries = BTreeMap::new();
    for slot in slots {
        let kept = reach.chain_for(&slot);
        if !kept.is_empty() {
            entries.insert(slot, kept);
        }
    }

    for skip in &reach.skipped {
        debug!(
            block = %skip.name,
            owner = %skip.owner,
            enclosing = %skip.enclosing,
            "skipping unreachable nested override"
        );
    }

    let chain = OverrideChain {
        templates: templates.clone(),
        root,
        includes: included
            .iter()
            .map(|e| (e.id().to_string(), e.root().clone()))
            .collect(),
        entries,
        skipped: reach.skipped,
    };
    chain.validate()?;

    debug!(
        chain = %templates,
        slots = chain.entries.len(),
        includes = chain.includes.len(),
        skipped = chain.skipped.len(),
        "built override chain"
    );
    Ok(chain)
}

/// Included templates reachable from the chain, in first-use order
fn collect_includes<'r>(
    registry: &'r TemplateRegistry,
    templates: &TemplateChain,
    chain_entries: &[&'r TemplateEntry],
) -> Result<Vec<&'r TemplateEntry>, ResolveError> {
    let mut order: Vec<&'r TemplateEntry> = Vec::new();
    let mut visiting: Vec<String> = Vec::new();

    for entry in chain_entries {
        for id in includes_of(entry) {
            visit_include(registry, templates, id, &mut visiting, &mut order)?;
        }
    }
    Ok(order)
}

fn visit_include<'r>(
    registry: &'r TemplateRegistry,
    templates: &TemplateChain,
    id: &str,
    visiting: &mut Vec<String>,
    order: &mut Vec<&'r TemplateEntry>,
) -> Result<(), ResolveError> {
    if visiting.iter().any(|v| v == id) {
        let mut cycle = visiting.clone();
        cycle.push(id.to_string());
        return Err(ResolveError::CyclicInclude {
            chain: cycle.join(" -> "),
        });
    }
    if templates.contains(id) {
        return Err(ResolveError::InvalidInclude {
            template: id.to_string(),
            reason: "template is part of the inheritance chain".to_string(),
        });
    }
    if order.iter().any(|e| e.id() == id) {
        return Ok(());
    }

    let entry = registry
        .get(id)
        .ok_or_else(|| ResolveError::TemplateNotFound { id: id.to_string() })?;
    if let Some(parent) = entry.parent() {
        return Err(ResolveError::InvalidInclude {
            template: id.to_string(),
            reason: format!("included templates cannot extend another template (extends '{}')", parent),
        });
    }

    order.push(entry);
    visiting.push(id.to_string());
    for nested in includes_of(entry) {
        visit_include(registry, templates, nested, visiting, order)?;
    }
    visiting.pop();
    Ok(())
}

fn includes_of(entry: &TemplateEntry) -> impl Iterator<Item = &str> {
    entry
        .root()
        .includes()
        .chain(entry.definitions().iter().flat_map(|d| d.body.includes()))
}

/// Memoized reachability filter over candidate definitions
struct Reachability<'a> {
    candidates: &'a [Arc<BlockDefinition>],
    resolved: HashMap<BlockSlot, Vec<Arc<BlockDefinition>>>,
    in_progress: HashSet<BlockSlot>,
    skipped: Vec<SkippedOverride>,
}

impl<'a> Reachability<'a> {
    fn new(candidates: &'a [Arc<BlockDefinition>]) -> Self {
        Self {
            candidates,
            resolved: HashMap::new(),
            in_progress: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    fn chain_for(&mut self, slot: &BlockSlot) -> Vec<Arc<BlockDefinition>> {
        if let Some(done) = self.resolved.get(slot) {
            return done.clone();
        }
        let candidates: Vec<Arc<BlockDefinition>> = self
            .candidates
            .iter()
            .filter(|def| slot.admits(def))
            .cloned()
            .collect();
        // Blocks nested inside each other by name; stop filtering there
        if !self.in_progress.insert(slot.clone()) {
            return candidates;
        }

        let mut kept = Vec::with_capacity(candidates.len());
        for def in candidates {
            if !def.is_nested() || self.is_reachable(&def) {
                kept.push(def);
            } else {
                self.skipped.push(SkippedOverride {
                    name: def.name.clone(),
                    owner: def.owner.clone(),
                    enclosing: def.scope.join("/"),
                });
            }
        }

        self.in_progress.remove(slot);
        self.resolved.insert(slot.clone(), kept.clone());
        kept
    }

    /// Whether the enclosing definition declared alongside nested `def`
    /// executes when its own slot is rendered.
    fn is_reachable(&mut self, def: &BlockDefinition) -> bool {
        let Some((enclosing, outer)) = def.scope.split_last() else {
            return true;
        };
        let slot = BlockSlot::new(outer.iter().cloned(), enclosing.clone());
        for candidate in self.chain_for(&slot) {
            if candidate.owner == def.owner && candidate.scope == outer {
                return true;
            }
            if !candidate.extends_parent() {
                return false;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::node::Node;
    use crate::template::registry::BlockMode;

    fn layout_registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template(
                "layout",
                None,
                vec![Node::text("<main>"), Node::block("content"), Node::text("</main>")].into(),
            )
            .expect("Should declare");
        registry
            .register("layout", "content", Body::text("Hello world!"), vec![])
            .expect("Should register");
        registry
            .declare_template("page", Some("layout".to_string()), Body::default())
            .expect("Should declare");
        registry
    }

    #[test]
    fn test_template_chain_follows_parents() {
        let registry = layout_registry();
        let chain = template_chain(&registry, "page").expect("Should build chain");
        assert_eq!(chain.ids(), &["page", "layout"]);
        assert_eq!(chain.leaf(), Some("page"));
        assert_eq!(chain.base(), Some("layout"));
    }

    #[test]
    fn test_template_chain_missing_parent() {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template("page", Some("nowhere".to_string()), Body::default())
            .expect("Should declare");
        let result = template_chain(&registry, "page");
        assert!(matches!(result, Err(ResolveError::TemplateNotFound { id }) if id == "nowhere"));
    }

    #[test]
    fn test_template_chain_cycle() {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template("a", Some("b".to_string()), Body::default())
            .expect("Should declare");
        registry
            .declare_template("b", Some("a".to_string()), Body::default())
            .expect("Should declare");
        let result = template_chain(&registry, "a");
        assert_eq!(
            result,
            Err(ResolveError::CyclicExtension {
                chain: "a -> b -> a".to_string()
            })
        );
    }

    #[test]
    fn test_build_chain_rejects_repeated_template() {
        let registry = layout_registry();
        let chain = TemplateChain::new(["layout", "page", "layout"]);
        let result = build_chain(&registry, &chain);
        assert!(matches!(result, Err(ResolveError::CyclicExtension { .. })));
    }

    #[test]
    fn test_derived_definition_precedes_base() {
        let mut registry = layout_registry();
        registry
            .register("page", "content", Body::text("Custom"), vec![])
            .expect("Should register");

        let chain = build_chain(&registry, &TemplateChain::new(["page", "layout"])).expect("Should build");
        assert_eq!(chain.owners("content"), vec!["page", "layout"]);

        let def = chain.resolve_top("content", 0).expect("Should resolve");
        assert_eq!(def.owner, "page");
        let parent = chain.resolve_top("content", 1).expect("Should resolve parent");
        assert_eq!(parent.owner, "layout");
    }

    #[test]
    fn test_resolve_top_unknown_name() {
        let registry = layout_registry();
        let chain = build_chain(&registry, &TemplateChain::new(["page", "layout"])).expect("Should build");
        assert_eq!(
            chain.resolve_top("sidebar", 0).map(|d| d.owner.clone()),
            Err(ResolveError::UnresolvedBlock {
                name: "sidebar".to_string(),
                cursor: 0
            })
        );
        assert!(matches!(
            chain.resolve_top("content", 1),
            Err(ResolveError::UnresolvedBlock { cursor: 1, .. })
        ));
    }

    #[test]
    fn test_build_chain_is_idempotent() {
        let mut registry = layout_registry();
        registry
            .register("page", "content", vec![Node::Parent, Node::text("!")], vec![])
            .expect("Should register");
        let templates = template_chain(&registry, "page").expect("Should build chain");
        let first = build_chain(&registry, &templates).expect("Should build");
        let second = build_chain(&registry, &templates).expect("Should build");
        assert_eq!(first, second);
    }

    #[test]
    fn test_unresolved_region_in_root_fails_at_build() {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template("layout", None, vec![Node::block("missing")].into())
            .expect("Should declare");
        let result = build_chain(&registry, &TemplateChain::new(["layout"]));
        assert!(matches!(
            result,
            Err(ResolveError::UnresolvedBlock { name, .. }) if name == "missing"
        ));
    }

    #[test]
    fn test_parent_call_in_base_fails_at_build() {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template("layout", None, vec![Node::block("content")].into())
            .expect("Should declare");
        registry
            .register("layout", "content", vec![Node::Parent], vec![])
            .expect("Should register");
        let result = build_chain(&registry, &TemplateChain::new(["layout"]));
        assert_eq!(
            result.map(|_| ()),
            Err(ResolveError::UnresolvedBlock {
                name: "content".to_string(),
                cursor: 1
            })
        );
    }

    /// base:   content_wrapper { <div> content </div> } with content nested
    /// middle: content_wrapper { <section> content </section> } with content nested
    /// top:    content_wrapper, mode given by the test
    fn three_level(top_wrapper: BlockDefinition) -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template("base", None, vec![Node::block("content_wrapper")].into())
            .expect("Should declare");
        registry
            .declare_template("middle", Some("base".to_string()), Body::default())
            .expect("Should declare");
        registry
            .declare_template("top", Some("middle".to_string()), Body::default())
            .expect("Should declare");

        for (template, tag, text) in [("base", "div", "Base"), ("middle", "section", "Middle")] {
            registry
                .register(
                    template,
                    "content_wrapper",
                    vec![
                        Node::text(format!("<{}>", tag)),
                        Node::block("content"),
                        Node::text(format!("</{}>", tag)),
                    ],
                    vec!["content".to_string()],
                )
                .expect("Should register");
            registry
                .register_nested(template, &["content_wrapper"], BlockDefinition::new("content", Body::text(text)))
                .expect("Should register nested");
        }

        registry
            .register_definition("top", top_wrapper)
            .expect("Should register");
        registry
    }

    #[test]
    fn test_replaced_enclosing_block_hides_nested_overrides() {
        let registry = three_level(
            BlockDefinition::new("content_wrapper", Body::text("<main>Top</main>")),
        );
        let templates = template_chain(&registry, "top").expect("Should build chain");
        let chain = build_chain(&registry, &templates).expect("Should build");

        assert!(chain.definitions("content").is_empty());
        assert!(chain
            .definitions_at(&BlockSlot::new(["content_wrapper"], "content"))
            .is_empty());
        let skipped: Vec<&str> = chain.skipped().iter().map(|s| s.owner.as_str()).collect();
        assert_eq!(skipped, vec!["middle", "base"]);
    }

    #[test]
    fn test_extended_enclosing_block_keeps_nested_overrides() {
        let registry = three_level(
            BlockDefinition::new("content_wrapper", Body::text("<aside/>")).with_mode(BlockMode::Prepend),
        );
        let templates = template_chain(&registry, "top").expect("Should build chain");
        let chain = build_chain(&registry, &templates).expect("Should build");

        // middle's wrapper replaces base's, so only middle's nested content survives
        let content = BlockSlot::new(["content_wrapper"], "content");
        assert_eq!(chain.owners_at(&content), vec!["middle"]);
        assert_eq!(chain.skipped().len(), 1);
        assert_eq!(chain.skipped()[0].owner, "base");
    }

    #[test]
    fn test_same_sub_block_under_two_parents_gets_two_slots() {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template(
                "layout",
                None,
                vec![Node::block("left_column"), Node::block("right_column")].into(),
            )
            .expect("Should declare");
        for (column, text) in [("left_column", "L"), ("right_column", "R")] {
            registry
                .register("layout", column, vec![Node::block("widget")], vec!["widget".to_string()])
                .expect("Should register");
            registry
                .register_nested("layout", &[column], BlockDefinition::new("widget", Body::text(text)))
                .expect("Should register nested");
        }

        let chain = build_chain(&registry, &TemplateChain::new(["layout"])).expect("Should build");
        let left = chain.slot_for(&["left_column"], "widget").expect("Should find slot");
        let right = chain.slot_for(&["right_column"], "widget").expect("Should find slot");
        assert_ne!(left, right);
        assert_eq!(right.to_string(), "right_column/widget");
        assert_eq!(chain.resolve_at(left, 0).map(|d| d.body.clone()), Ok(Body::text("L")));
        assert_eq!(chain.resolve_at(right, 0).map(|d| d.body.clone()), Ok(Body::text("R")));
        assert!(chain.definitions("widget").is_empty());
    }

    #[test]
    fn test_top_level_override_joins_every_slot_of_its_name() {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template("layout", None, vec![Node::block("a"), Node::block("b")].into())
            .expect("Should declare");
        registry
            .declare_template("page", Some("layout".to_string()), Body::default())
            .expect("Should declare");
        for column in ["a", "b"] {
            registry
                .register("layout", column, vec![Node::block("widget")], vec!["widget".to_string()])
                .expect("Should register");
            registry
                .register_nested("layout", &[column], BlockDefinition::new("widget", Body::text(column)))
                .expect("Should register nested");
        }
        registry
            .register("page", "widget", vec![Node::Parent], vec![])
            .expect("Should register");

        let chain = build_chain(&registry, &TemplateChain::new(["page", "layout"])).expect("Should build");
        for column in ["a", "b"] {
            let slot = chain.slot_for(&[column], "widget").expect("Should find slot");
            assert_eq!(chain.owners_at(slot), vec!["page", "layout"]);
        }
        assert_eq!(chain.owners("widget"), vec!["page"]);
    }

    #[test]
    fn test_include_cycle_detected() {
        let mut registry = TemplateRegistry::new();
        registry
            .declare_template("layout", None, vec![Node::include("a")].into())
            .expect("Should declare");
        registry
            .declare_template("a", None, vec![Node::include("b")].into())
            .expect("Should declare");
        registry
            .declare_template("b", None, vec![Node::include("a")].into())
            .expect("Should declare");

        let result = build_chain(&registry, &TemplateChain::new(["layout"]));
        assert_eq!(
            result.map(|_| ()),
            Err(ResolveError::CyclicInclude {
                chain: "a -> b -> a".to_string()
            })
        );
    }

    #[test]
    fn test_include_of_extending_template_rejected() {
        let mut registry = layout_registry();
        registry
            .declare_template("other", None, vec![Node::include("page")].into())
            .expect("Should declare");
        let result = build_chain(&registry, &TemplateChain::new(["other"]));
        assert!(matches!(result, Err(ResolveError::InvalidInclude { template, .. }) if template == "page"));
    }

    #[test]
    fn test_included_blocks_join_the_chain_after_base() {
        let mut registry = layout_registry();
        registry
            .declare_template("partials/head", None, vec![Node::block("head_title")].into())
            .expect("Should declare");
        registry
            .register("partials/head", "head_title", Body::text("Shop"), vec![])
            .expect("Should register");
        registry
            .register("layout", "head", vec![Node::include("partials/head")], vec![])
            .expect("Should register");
        registry
            .register("page", "head_title", vec![Node::Parent, Node::text(" | Page")], vec![])
            .expect("Should register");

        let chain = build_chain(&registry, &TemplateChain::new(["page", "layout"])).expect("Should build");
        assert_eq!(chain.owners("head_title"), vec!["page", "partials/head"]);
        assert!(chain.include_root("partials/head").is_some());
    }
}
