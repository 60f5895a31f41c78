//! Login throttling, keyed by email

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed per window
    pub max_attempts: u32,
    /// Time window
    pub window: Duration,
    /// How long a key stays banned once over the limit
    pub ban_duration: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(300),
            ban_duration: Duration::from_secs(3600),
        }
    }
}

/// Attempts made with one email
#[derive(Debug)]
struct LoginAttempts {
    count: u32,
    window_start: Instant,
    banned_until: Option<Instant>,
}

impl LoginAttempts {
    fn new(now: Instant) -> Self {
        LoginAttempts {
            count: 0,
            window_start: now,
            banned_until: None,
        }
    }

    fn restart(&mut self, now: Instant) {
        self.count = 0;
        self.window_start = now;
        self.banned_until = None;
    }

    /// Count one attempt; `false` once the key is banned
    fn register(&mut self, now: Instant, config: &RateLimiterConfig) -> bool {
        match self.banned_until {
            Some(until) if now < until => return false,
            Some(_) => self.restart(now),
            None if now.duration_since(self.window_start) >= config.window => self.restart(now),
            None => {}
        }

        if self.count >= config.max_attempts {
            self.banned_until = Some(now + config.ban_duration);
            return false;
        }
        self.count += 1;
        true
    }

    /// Neither banned nor inside a counting window any more
    fn is_stale(&self, now: Instant, config: &RateLimiterConfig) -> bool {
        let ban_over = self.banned_until.is_none_or(|until| now >= until);
        ban_over && now.duration_since(self.window_start) >= config.window
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    attempts: Arc<Mutex<HashMap<String, LoginAttempts>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and tell whether it may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> bool {
        let key = normalize(key);
        let mut attempts = self.attempts.lock().await;
        let entry = attempts
            .entry(key.clone())
            .or_insert_with(|| LoginAttempts::new(now));

        let was_banned = entry.banned_until.is_some_and(|until| now < until);
        let allowed = entry.register(now, &self.config);
        if !allowed && !was_banned {
            info!(
                "Banned login key {} for {} seconds",
                key,
                self.config.ban_duration.as_secs()
            );
        }
        allowed
    }

    /// Forget a key, after a successful login
    pub async fn reset(&self, key: &str) {
        self.attempts.lock().await.remove(&normalize(key));
    }

    /// Drop keys with no live window or ban, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        self.cleanup_at(Instant::now()).await
    }

    async fn cleanup_at(&self, now: Instant) -> usize {
        let mut attempts = self.attempts.lock().await;
        let before = attempts.len();
        attempts.retain(|_, entry| !entry.is_stale(now, &self.config));
        let removed = before - attempts.len();
        if removed > 0 {
            debug!("Dropped {} stale login throttling keys", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.attempts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Periodically drop stale keys
    pub fn spawn_cleanup(&self, every: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                limiter.cleanup_expired().await;
            }
        })
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
