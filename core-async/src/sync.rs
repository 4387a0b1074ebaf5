//! Synchronization primitives.
//!
//! - `tokio::sync` channels on every target (they do not need the Tokio
//!   runtime and build for `wasm32`)
//! - On native platforms: `tokio_util`'s `CancellationToken`
//! - On WASM: a single-threaded cancellation flag
//!
//! Only the primitives the narration core actually waits on are exported: the
//! `watch` channel used to await a chunk's fetch outcome, `broadcast` for the
//! event bus, and `CancellationToken` for timers.

pub use tokio::sync::{broadcast, watch};

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use tokio_util::sync::CancellationToken;

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use wasm_cancel::CancellationToken;

#[cfg(target_arch = "wasm32")]
mod wasm_cancel {
    use futures::channel::oneshot;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Single-threaded cancellation token.
    ///
    /// Clones share the same flag; `cancelled()` resolves once `cancel()` is
    /// called on any clone.
    #[derive(Clone, Default)]
    pub struct CancellationToken {
        inner: Rc<RefCell<Inner>>,
    }

    #[derive(Default)]
    struct Inner {
        cancelled: bool,
        waiters: Vec<oneshot::Sender<()>>,
    }

    impl CancellationToken {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn cancel(&self) {
            let mut inner = self.inner.borrow_mut();
            inner.cancelled = true;
            for waiter in inner.waiters.drain(..) {
                let _ = waiter.send(());
            }
        }

        pub fn is_cancelled(&self) -> bool {
            self.inner.borrow().cancelled
        }

        pub async fn cancelled(&self) {
            let rx = {
                let mut inner = self.inner.borrow_mut();
                if inner.cancelled {
                    return;
                }
                let (tx, rx) = oneshot::channel();
                inner.waiters.push(tx);
                rx
            };
            let _ = rx.await;
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watch_wait_for_resolves_on_matching_value() {
        let (tx, mut rx) = watch::channel(0u8);
        let waiter = tokio::spawn(async move { *rx.wait_for(|v| *v == 2).await.unwrap() });

        tx.send(1).unwrap();
        tx.send(2).unwrap();

        assert_eq!(waiter.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn cancellation_token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        clone.cancel();

        assert!(token.is_cancelled());
        token.cancelled().await;
    }
}
