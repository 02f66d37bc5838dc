//! Lifecycle hook overrides.
//!
//! Each hook defaults to the plugin's own method. An override replaces it for
//! one dispatcher and receives the plugin, so it can still call the default.

use plinth_core::{BoxWriter, Plugin, Request, ResponseWriter};
use std::{fmt, sync::Arc};

/// Override for `before_dispatch` or `after_dispatch`.
pub type DispatchHook = dyn Fn(&dyn Plugin, &mut BoxWriter<'_>, &mut Request) + Send + Sync;

/// Override for `recover`.
pub type RecoverHook = dyn Fn(&dyn Plugin, &mut dyn ResponseWriter, &Request) + Send + Sync;

#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) before: Option<Arc<DispatchHook>>,
    pub(crate) after: Option<Arc<DispatchHook>>,
    pub(crate) recover: Option<Arc<RecoverHook>>,
}

impl Hooks {
    pub(crate) fn before(&self, plugin: &dyn Plugin, w: &mut BoxWriter<'_>, req: &mut Request) {
        match &self.before {
            Some(hook) => hook(plugin, w, req),
            None => plugin.before_dispatch(w, req),
        }
    }

    pub(crate) fn after(&self, plugin: &dyn Plugin, w: &mut BoxWriter<'_>, req: &mut Request) {
        match &self.after {
            Some(hook) => hook(plugin, w, req),
            None => plugin.after_dispatch(w, req),
        }
    }

    pub(crate) fn recover(&self, plugin: &dyn Plugin, w: &mut dyn ResponseWriter, req: &Request) {
        match &self.recover {
            Some(hook) => hook(plugin, w, req),
            None => plugin.recover(w, req),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("recover", &self.recover.is_some())
            .finish()
    }
}
