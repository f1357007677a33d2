use std::cell::RefCell;
use std::sync::Arc;

use super::scope::CodeScope;

thread_local! {
    static CONTEXT_SCOPE: RefCell<Option<Arc<dyn CodeScope>>> = const { RefCell::new(None) };
}

/// Replace the calling thread's context scope, returning the previous one.
pub fn set_context_scope(scope: Option<Arc<dyn CodeScope>>) -> Option<Arc<dyn CodeScope>> {
    CONTEXT_SCOPE.with(|slot| slot.replace(scope))
}

/// The scope code running on this thread should load through, if set.
pub fn context_scope() -> Option<Arc<dyn CodeScope>> {
    CONTEXT_SCOPE.with(|slot| slot.borrow().clone())
}
