//! Sleep timer: stop narration after a fixed amount of listening time.

use crate::queue::{QueueManager, QueueState};
use core_async::sync::CancellationToken;
use core_async::time::{Duration, Instant};
use futures::future::{select, Either};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Stops a [`QueueManager`] once its countdown runs out.
///
/// The countdown only advances while the queue is `Playing`; pausing holds
/// it and a timer armed on an idle queue waits for `start`. The timer
/// disarms itself when the queue stops or completes, so it never reaches
/// into a later session.
///
/// Re-arming replaces the running countdown. Clones share the same timer.
#[derive(Clone, Default)]
pub struct SleepTimer {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Default)]
struct Slot {
    next_id: u64,
    armed: Option<Armed>,
}

struct Armed {
    id: u64,
    token: CancellationToken,
    /// Countdown left as of the last checkpoint.
    left: Duration,
    /// Set while the queue is playing.
    running_since: Option<Instant>,
}

impl Armed {
    fn remaining(&self) -> Duration {
        self.running_since
            .map_or(self.left, |since| self.left.saturating_sub(since.elapsed()))
    }
}

enum Wake {
    Cancelled,
    Expired,
    Changed { open: bool },
}

impl SleepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop `queue` after `duration` of playback unless cancelled or
    /// re-armed first.
    pub fn arm(&self, queue: QueueManager, duration: Duration) {
        let mut status = queue.watch_status();
        let initial = *status.borrow_and_update();
        let mut running = initial.state == QueueState::Playing;

        let token = CancellationToken::new();
        let id = {
            let mut slot = self.slot.lock();
            if let Some(previous) = slot.armed.take() {
                previous.token.cancel();
            }
            slot.next_id += 1;
            let id = slot.next_id;
            slot.armed = Some(Armed {
                id,
                token: token.clone(),
                left: duration,
                running_since: running.then(Instant::now),
            });
            id
        };

        info!(seconds = duration.as_secs(), running, "Sleep timer armed");
        let slot = Arc::clone(&self.slot);
        core_async::spawn(async move {
            let mut left = duration;
            loop {
                let wake = {
                    let cancelled = std::pin::pin!(token.cancelled());
                    let expiry = std::pin::pin!(async move {
                        if running {
                            core_async::sleep(left).await
                        } else {
                            std::future::pending::<()>().await
                        }
                    });
                    let changed = std::pin::pin!(status.changed());
                    match select(cancelled, select(expiry, changed)).await {
                        Either::Left(_) => Wake::Cancelled,
                        Either::Right((Either::Left(_), _)) => Wake::Expired,
                        Either::Right((Either::Right((changed, _)), _)) => Wake::Changed {
                            open: changed.is_ok(),
                        },
                    }
                };

                match wake {
                    Wake::Cancelled => {
                        debug!(id, "Sleep timer cancelled");
                        return;
                    }
                    Wake::Expired => {
                        if disarm(&slot, id) {
                            info!("Sleep timer expired, stopping narration");
                            queue.stop().await;
                        }
                        return;
                    }
                    Wake::Changed { open: false } => {
                        disarm(&slot, id);
                        return;
                    }
                    Wake::Changed { open: true } => {
                        let now = *status.borrow_and_update();
                        if now.endings != initial.endings {
                            if disarm(&slot, id) {
                                debug!(state = ?now.state, "Queue ended, sleep timer disarmed");
                            }
                            return;
                        }

                        running = now.state == QueueState::Playing;
                        let mut guard = slot.lock();
                        match guard.armed.as_mut().filter(|armed| armed.id == id) {
                            Some(armed) => {
                                armed.left = armed.remaining();
                                armed.running_since = running.then(Instant::now);
                                left = armed.left;
                            }
                            None => return,
                        }
                    }
                }
            }
        });
    }

    /// Disarm the timer. Returns `false` if nothing was armed.
    pub fn cancel(&self) -> bool {
        match self.slot.lock().armed.take() {
            Some(armed) => {
                armed.token.cancel();
                debug!("Sleep timer disarmed");
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot.lock().armed.is_some()
    }

    /// Playback time left before the queue is stopped, `None` when disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        self.slot.lock().armed.as_ref().map(Armed::remaining)
    }
}

/// Clear the slot if it still holds timer `id`.
fn disarm(slot: &Mutex<Slot>, id: u64) -> bool {
    let mut slot = slot.lock();
    if slot.armed.as_ref().is_some_and(|armed| armed.id == id) {
        slot.armed = None;
        true
    } else {
        false
    }
}
