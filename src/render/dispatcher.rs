//! Renderer: walks the base layout and dispatches each region to its
//! resolved block implementation

use std::sync::Arc;

use tracing::{debug, trace};

use crate::data::PageData;
use crate::hooks::{HookDispatcher, NoHooks};
use crate::sanitize::{Sanitizer, Verbatim};
use crate::template::{
    BlockDefinition, BlockMode, BlockSlot, Body, Node, OverrideChain, ResolveError,
};
use crate::RenderError;

use super::config::RenderConfig;
use super::context::RenderContext;

/// Renders one override chain against page data
pub struct Renderer<'r> {
    chain: &'r OverrideChain,
    hooks: &'r dyn HookDispatcher,
    sanitizer: &'r dyn Sanitizer,
    config: &'r RenderConfig,
}

impl<'r> Renderer<'r> {
    /// Renderer with no hooks and verbatim variable output
    pub fn new(chain: &'r OverrideChain, config: &'r RenderConfig) -> Self {
        Self {
            chain,
            hooks: &NoHooks,
            sanitizer: &Verbatim,
            config,
        }
    }

    pub fn with_hooks(mut self, hooks: &'r dyn HookDispatcher) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: &'r dyn Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Render the base template's root body.
    ///
    /// Output is only returned when the whole render succeeds.
    pub fn render(&self, data: &dyn PageData) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render_body(self.chain.root(), &[], RenderContext::new(data), &mut out)?;
        debug!(chain = %self.chain.templates(), bytes = out.len(), "rendered template");
        Ok(out)
    }

    /// Render a single region as if the base layout reached it at the top level
    pub fn render_block(&self, name: &str, data: &dyn PageData) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render_region(name, &[], RenderContext::new(data), &mut out)?;
        Ok(out)
    }

    /// Render `body`, declared inside the blocks at `scope`
    fn render_body(
        &self,
        body: &Body,
        scope: &[String],
        ctx: RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for node in body.nodes() {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Block(name) => self.render_region(name, scope, ctx, out)?,
                Node::Parent => self.render_parent(ctx, out)?,
                Node::Var { path, escape } => {
                    let value = ctx.data().lookup(path)?;
                    if *escape {
                        out.push_str(&self.sanitizer.sanitize(&value));
                    } else {
                        out.push_str(&value);
                    }
                }
                Node::Hook(hook) => match self.hooks.dispatch(hook, ctx.data()) {
                    Some(markup) => out.push_str(&markup),
                    None if self.config.strict_hooks => {
                        return Err(RenderError::UnknownHook(hook.clone()));
                    }
                    None => trace!(hook = %hook, "unhandled hook"),
                },
                Node::Include(id) => {
                    let root = self
                        .chain
                        .include_root(id)
                        .ok_or_else(|| ResolveError::TemplateNotFound { id: id.clone() })?;
                    self.render_body(root, &[], ctx, out)?;
                }
            }
        }
        Ok(())
    }

    /// Resolve region `name` and execute it.
    ///
    /// A name already executing further up resumes that block's chain past
    /// its running definition; otherwise the region fills the slot for
    /// `scope` from the top.
    fn render_region(
        &self,
        name: &str,
        scope: &[String],
        ctx: RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let (slot, cursor) = match ctx.frame(name) {
            Some(frame) => (frame.slot(), frame.next()),
            None => {
                let slot = self.chain.slot_for(scope, name).ok_or_else(|| {
                    ResolveError::UnresolvedBlock {
                        name: name.to_string(),
                        cursor: 0,
                    }
                })?;
                (slot, 0)
            }
        };
        let def = self.chain.resolve_at(slot, cursor)?;
        self.execute(slot, def, cursor, ctx, out)
    }

    /// Execute the definition below the innermost executing block
    fn render_parent(&self, ctx: RenderContext<'_>, out: &mut String) -> Result<(), RenderError> {
        let frame = ctx.current().ok_or(RenderError::ParentOutsideBlock)?;
        let def = self.chain.resolve_at(frame.slot(), frame.next())?;
        self.execute(frame.slot(), def, frame.next(), ctx, out)
    }

    fn execute(
        &self,
        slot: &BlockSlot,
        def: &Arc<BlockDefinition>,
        index: usize,
        ctx: RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        if ctx.depth() >= self.config.max_depth {
            return Err(RenderError::DepthExceeded {
                block: def.name.clone(),
                max_depth: self.config.max_depth,
            });
        }
        trace!(%slot, index, owner = %def.owner, "executing block");

        let frame = ctx.enter(slot, index);
        let scoped = ctx.with_scope(&frame);
        let scope = def.path();
        match def.mode {
            BlockMode::Replace => self.render_body(&def.body, &scope, scoped, out),
            BlockMode::Append => {
                self.render_parent(scoped, out)?;
                self.render_body(&def.body, &scope, scoped, out)
            }
            BlockMode::Prepend => {
                self.render_body(&def.body, &scope, scoped, out)?;
                self.render_parent(scoped, out)
            }
        }
    }
}
