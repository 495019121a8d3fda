//! Rolling-window rate limiter for the feed client.
//!
//! The upstream feed API allows a fixed number of requests per window and
//! announces hard pauses via 429 responses. This limiter tracks one window
//! per client instance: callers `acquire()` before each request and
//! `record_success()` once a response arrives, so failed attempts never
//! consume budget.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

/// Default window length: 15 minutes.
const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Default request budget per window, kept below the upstream cap for
/// headroom.
const DEFAULT_MAX_REQUESTS: u32 = 1450;

/// Rate limiter configuration.
#[derive(Clone, Debug)]
pub struct RollingWindowConfig {
    /// Window length after which the budget resets.
    pub window: Duration,
    /// Number of successful requests allowed per window.
    pub max_requests: u32,
}

impl Default for RollingWindowConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

/// Mutable window state, guarded by the limiter's mutex.
#[derive(Debug)]
struct WindowState {
    /// Successful requests counted against the current window.
    count: u32,
    /// Instant at which the current window ends.
    window_reset: Instant,
    /// Server-announced pause deadline, overriding the local window.
    paused_until: Option<Instant>,
}

impl WindowState {
    /// Starts a fresh window at `now`.
    fn roll_window(&mut self, now: Instant, window: Duration) {
        self.count = 0;
        self.window_reset = now + window;
    }
}

/// Rolling-window rate limiter for a single upstream provider.
///
/// Thread-safe; the feed client shares one instance across concurrent
/// source polls.
pub struct RollingWindow {
    state: Mutex<WindowState>,
    config: RollingWindowConfig,
}

impl RollingWindow {
    /// Create a limiter with the upstream defaults.
    pub fn new() -> Self {
        Self::with_config(RollingWindowConfig::default())
    }

    /// Create a limiter with custom settings.
    pub fn with_config(config: RollingWindowConfig) -> Self {
        Self {
            state: Mutex::new(WindowState {
                count: 0,
                window_reset: Instant::now() + config.window,
                paused_until: None,
            }),
            config,
        }
    }

    /// Lock the state mutex, recovering from poison if necessary.
    ///
    /// For rate limiting, it's safe to recover from a poisoned mutex since
    /// the worst case is slightly incorrect rate limiting, which is better
    /// than panicking.
    fn lock_state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait until a request may be sent.
    ///
    /// Honors, in order: a server-announced pause (waiting until its
    /// deadline, then resuming with a fresh window), window expiry (rolling
    /// the window), and the per-window budget (sleeping until the window
    /// resets when the budget is spent). Acquiring does not consume budget;
    /// call [`record_success`](Self::record_success) when a response
    /// arrives.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut state = self.lock_state();
                let now = Instant::now();

                // An expired pause resumes with a clean slate
                if let Some(deadline) = state.paused_until {
                    if now >= deadline {
                        state.paused_until = None;
                        state.roll_window(now, self.config.window);
                    }
                }

                match state.paused_until {
                    Some(deadline) => deadline.duration_since(now),
                    None => {
                        if now >= state.window_reset {
                            state.roll_window(now, self.config.window);
                        }
                        if state.count < self.config.max_requests {
                            return;
                        }
                        state.window_reset.duration_since(now)
                    }
                }
            };

            debug!("Rate limiter: waiting {:?} before next request", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Count one successful request against the current window.
    pub fn record_success(&self) {
        let mut state = self.lock_state();
        let now = Instant::now();
        if now >= state.window_reset {
            state.roll_window(now, self.config.window);
        }
        state.count += 1;
    }

    /// Suspend all requests until `deadline`, as instructed by the server.
    /// The window and counter reset when the pause lifts.
    pub fn pause_until(&self, deadline: Instant) {
        let mut state = self.lock_state();
        state.paused_until = Some(deadline);
        info!(
            "Rate limiter: suspending requests for {:?} (server-announced reset)",
            deadline.saturating_duration_since(Instant::now())
        );
    }

    /// Requests left in the current window.
    pub fn remaining(&self) -> u32 {
        let state = self.lock_state();
        if Instant::now() >= state.window_reset {
            self.config.max_requests
        } else {
            self.config.max_requests.saturating_sub(state.count)
        }
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new()
    }
}
