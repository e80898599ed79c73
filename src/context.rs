//! Execution context passed explicitly into every store call.
//!
//! The context carries the flags a store needs to decide which side effects
//! to run for a write: the privilege scope and whether search indexing is
//! enabled. It is a plain value; entering a scope returns a new context.

use serde::Serialize;

/// Privilege scope of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Regular operation with normal entity-lifecycle side effects.
    #[default]
    Default,
    /// Elevated maintenance operation. Stores skip access checks and
    /// lifecycle side effects such as search-index refresh.
    System,
}

/// Whether writes should refresh the store's search index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indexing {
    /// Index refresh follows every mutation.
    #[default]
    Enabled,
    /// Index refresh is suppressed for the life of the context.
    Disabled,
}

/// Flags describing how store operations should behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    /// Privilege scope.
    pub scope: Scope,
    /// Search indexing mode.
    pub indexing: Indexing,
}

impl ExecutionContext {
    /// Creates the default context: default scope, indexing enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scope: Scope::Default,
            indexing: Indexing::Enabled,
        }
    }

    /// Returns a copy of this context with indexing disabled.
    #[must_use]
    pub const fn without_indexing(mut self) -> Self {
        self.indexing = Indexing::Disabled;
        self
    }

    /// Returns a copy of this context running in the given scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Returns a copy of this context elevated to the system scope.
    #[must_use]
    pub const fn elevated(self) -> Self {
        self.with_scope(Scope::System)
    }

    /// Returns true if the context runs in the system scope.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self.scope, Scope::System)
    }

    /// Returns true unless indexing was disabled for this context.
    #[must_use]
    pub const fn indexing_enabled(&self) -> bool {
        matches!(self.indexing, Indexing::Enabled)
    }

    /// Returns true if mutations should refresh downstream indexes.
    #[must_use]
    pub const fn triggers_side_effects(&self) -> bool {
        matches!(self.scope, Scope::Default) && self.indexing_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_triggers_side_effects() {
        let context = ExecutionContext::new();
        assert_eq!(context, ExecutionContext::default());
        assert!(!context.is_system());
        assert!(context.triggers_side_effects());
    }

    #[test]
    fn test_elevated_context_keeps_indexing_flag() {
        let context = ExecutionContext::new().without_indexing().elevated();
        assert!(context.is_system());
        assert_eq!(context.indexing, Indexing::Disabled);
        assert!(ExecutionContext::new().elevated().indexing_enabled());
        assert!(!context.triggers_side_effects());
    }

    #[test]
    fn test_disabled_indexing_suppresses_side_effects() {
        let context = ExecutionContext::new().without_indexing();
        assert!(!context.is_system());
        assert!(!context.indexing_enabled());
        assert!(!context.triggers_side_effects());
    }
}
