use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Result, TextraError};

// Stale windows are swept once the table grows past this.
const PRUNE_THRESHOLD: usize = 1024;

/// Fixed-window request counter keyed by (client, route).
///
/// The check runs before any pipeline work, so a rejected request costs no
/// provider call.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<(String, String), Window>>>,
    window: Duration,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            window,
        }
    }

    /// Admits or rejects one request for `client` on `route` under `quota`
    /// requests per window. Counters reset when their window expires.
    pub fn check(&self, client: &str, route: &str, quota: u32) -> Result<()> {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();

        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows
            .entry((client.to_string(), route.to_string()))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= quota {
            return Err(TextraError::RateLimited(format!(
                "{quota} per {} seconds",
                self.window.as_secs()
            )));
        }

        entry.count += 1;
        Ok(())
    }
}
