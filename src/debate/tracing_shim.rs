//! The Tracing Shim (C9): decorates C1/C3/C4/C6 with a nested span tree
//! when enabled. Re-expressed from class decoration as a wrapping type that
//! holds an optional span and degrades to a no-op when tracing is
//! disabled — span creation in `tracing` cannot itself fail, so the
//! "failure must never affect outcome" requirement holds structurally.

use tracing::Span;

/// A tracing handle for one debate run. Empty when `cfg.trace` was absent.
pub struct TraceHandle {
    root: Option<Span>,
}

impl TraceHandle {
    pub fn enabled(trace_key: &str, debate_id: &str) -> Self {
        TraceHandle {
            root: Some(tracing::info_span!("debate", trace = %trace_key, debate_id = %debate_id)),
        }
    }

    pub fn disabled() -> Self {
        TraceHandle { root: None }
    }

    pub fn from_config(trace_key: Option<&str>, debate_id: &str) -> Self {
        match trace_key {
            Some(key) => Self::enabled(key, debate_id),
            None => Self::disabled(),
        }
    }

    /// Opens a child span scoped to the handle's lifetime, or a disabled
    /// span when tracing is off, matching `Span::none()` semantics so
    /// callers can `.enter()` unconditionally.
    pub fn span(&self, name: &'static str) -> Span {
        match &self.root {
            Some(root) => {
                let _enter = root.enter();
                tracing::info_span!(parent: root, "child", name)
            }
            None => Span::none(),
        }
    }

    pub fn generation_span(&self, agent_name: &str, activity: &str) -> Span {
        match &self.root {
            Some(root) => {
                tracing::debug_span!(parent: root, "generation", agent = %agent_name, activity = %activity)
            }
            None => Span::none(),
        }
    }
}
