//! Configuration for rendering

/// Configuration options for the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Maximum nesting of block executions before the render is aborted
    pub max_depth: usize,

    /// Fail on hooks nobody handles instead of emitting nothing
    pub strict_hooks: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            strict_hooks: false,
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum block nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set whether unknown hooks are errors
    pub fn with_strict_hooks(mut self, strict: bool) -> Self {
        self.strict_hooks = strict;
        self
    }
}
