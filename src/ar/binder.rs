//! Scoped binding of the "current" resolver context.
//!
//! Bindings live in a per-thread stack, so compositions running on different
//! threads never observe each other's contexts.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::sync::Arc;

use super::context::ResolverContext;

struct Binding {
    id: u64,
    context: Option<Arc<ResolverContext>>,
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Binding>> = const { RefCell::new(Vec::new()) };
    static NEXT_BINDING_ID: Cell<u64> = const { Cell::new(0) };
}

/// Makes a context current for the calling thread until the binder is dropped.
///
/// Dropping the binder restores whatever was current before it was created,
/// including when the scope is left by unwinding. Binders nest: the innermost
/// one shadows all outer ones.
///
/// ```
/// use replace_resolver::ar::{current_context, ResolverContext, ResolverContextBinder};
///
/// let ctx = ResolverContext::new(["/assets"]).with_replace_pair("a_v1.usda", "a_v2.usda");
/// {
///     let _binder = ResolverContextBinder::new(ctx.clone());
///     assert_eq!(current_context().as_deref(), Some(&ctx));
/// }
/// assert!(current_context().is_none());
/// ```
#[must_use = "the context is unbound as soon as the binder is dropped"]
pub struct ResolverContextBinder {
    context: Option<Arc<ResolverContext>>,
    id: u64,
    // Bindings are per thread; the guard must be released where it was created.
    _not_send: PhantomData<*const ()>,
}

impl ResolverContextBinder {
    /// Bind `context` for the calling thread.
    pub fn new(context: impl Into<Arc<ResolverContext>>) -> Self {
        Self::push(Some(context.into()))
    }

    /// Shadow any outer binding with "no context" for the duration of the scope.
    pub fn empty() -> Self {
        Self::push(None)
    }

    fn push(context: Option<Arc<ResolverContext>>) -> Self {
        if let Some(ctx) = &context {
            log::debug!(target: "replace_resolver::context", "Binding resolver context:\n{ctx}");
        }

        let id = NEXT_BINDING_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });

        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(Binding {
                id,
                context: context.clone(),
            })
        });

        Self {
            context,
            id,
            _not_send: PhantomData,
        }
    }

    /// The context this binder made current, if any.
    pub fn context(&self) -> Option<&ResolverContext> {
        self.context.as_deref()
    }
}

impl Drop for ResolverContextBinder {
    fn drop(&mut self) {
        let _ = CONTEXT_STACK.try_with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.iter().rposition(|binding| binding.id == self.id) {
                Some(index) => {
                    if index + 1 != stack.len() {
                        log::error!(
                            "Unbinding resolver context in unexpected order ({} newer binding(s) still active)",
                            stack.len() - index - 1
                        );
                    }
                    stack.truncate(index);
                }
                // Already unbound by an enclosing binder released out of order.
                None => log::error!("Unbinding resolver context that is no longer bound"),
            }
        });
    }
}

/// The context bound on the calling thread, if any.
pub fn current_context() -> Option<Arc<ResolverContext>> {
    CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|binding| binding.context.clone()))
}

/// Run `f` with `context` bound, restoring the previous binding afterwards.
pub fn with_context<R>(context: impl Into<Arc<ResolverContext>>, f: impl FnOnce() -> R) -> R {
    let _binder = ResolverContextBinder::new(context);
    f()
}
