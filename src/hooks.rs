//! Hook dispatch: named extension points that return markup

use std::collections::HashMap;
use std::fmt;

use crate::data::PageData;

/// Answers `Hook` nodes with markup
pub trait HookDispatcher: Send + Sync {
    /// Markup for `hook`, or `None` if nothing handles it
    fn dispatch(&self, hook: &str, data: &dyn PageData) -> Option<String>;
}

/// Dispatcher that handles nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl HookDispatcher for NoHooks {
    fn dispatch(&self, _hook: &str, _data: &dyn PageData) -> Option<String> {
        None
    }
}

type HookFn = Box<dyn Fn(&dyn PageData) -> String + Send + Sync>;

/// Hook dispatcher backed by named closures
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<String, HookFn>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.hooks.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same name
    pub fn on<F>(&mut self, hook: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&dyn PageData) -> String + Send + Sync + 'static,
    {
        self.hooks.insert(hook.into(), Box::new(handler));
        self
    }

    /// Register a handler that always returns the same markup
    pub fn on_static(&mut self, hook: impl Into<String>, markup: impl Into<String>) -> &mut Self {
        let markup = markup.into();
        self.on(hook, move |_| markup.clone())
    }

    pub fn contains(&self, hook: &str) -> bool {
        self.hooks.contains_key(hook)
    }
}

impl HookDispatcher for HookRegistry {
    fn dispatch(&self, hook: &str, data: &dyn PageData) -> Option<String> {
        self.hooks.get(hook).map(|handler| handler(data))
    }
}
