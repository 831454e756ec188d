use super::core::Router;
use crate::call::Call;
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// A router that can be reconfigured while calls are being dispatched.
///
/// Readers load the current snapshot lock-free. Writers are serialised by a
/// mutex, build a modified copy and publish it with a single atomic swap, so a
/// dispatch never observes a half-rebuilt error index.
pub struct SharedRouter {
    current: ArcSwap<Router>,
    writer: Mutex<()>,
}

impl SharedRouter {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            current: ArcSwap::from_pointee(router),
            writer: Mutex::new(()),
        }
    }

    /// Snapshot of the current router.
    #[must_use]
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    pub fn dispatch(&self, call: &mut Call) {
        self.current.load().dispatch(call);
    }

    /// Apply `f` to a copy of the current router and publish the result.
    pub fn update<T>(&self, f: impl FnOnce(&mut Router) -> T) -> T {
        let _guard = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut next = Router::clone(&self.current.load());
        let out = f(&mut next);
        let handlers_count = next.handlers().len();
        self.current.store(Arc::new(next));
        info!(handlers_count, "Router updated");
        out
    }

    /// Publish `router` as is.
    pub fn replace(&self, router: Router) {
        let _guard = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let handlers_count = router.handlers().len();
        self.current.store(Arc::new(router));
        info!(handlers_count, "Router replaced");
    }
}

impl From<Router> for SharedRouter {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}
