#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use super::connection::ConnectionManager;
use super::event::CloseFrame;
use super::log::Message;
use crate::error::Error;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BASE_DELAY_DURATION: Duration = Duration::from_millis(3000);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;
const DEFAULT_MAX_DELAY_DURATION: Duration = Duration::from_secs(3600);

/// Invoked after the manager has moved to `Connected`.
pub type OpenHandler = Arc<dyn Fn(&mut ConnectionManager) + Send + Sync>;
/// Invoked after a received message has been logged.
pub type MessageHandler = Arc<dyn Fn(&mut ConnectionManager, &Message) + Send + Sync>;
/// Invoked after the transport handle has been released, before any reconnect is scheduled.
pub type CloseHandler = Arc<dyn Fn(&mut ConnectionManager, &CloseFrame) + Send + Sync>;
/// Invoked after the manager has moved to `Error`.
pub type ErrorHandler = Arc<dyn Fn(&mut ConnectionManager, &Error) + Send + Sync>;

/// Configuration for automatic reconnection behavior.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Maximum number of reconnection attempts before giving up
    pub max_attempts: u32,
    /// Delay before the first reconnection attempt
    pub base_delay: Duration,
    /// Multiplier applied to the delay for each further attempt
    pub backoff_multiplier: f64,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY_DURATION,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: DEFAULT_MAX_DELAY_DURATION,
        }
    }
}

impl ReconnectConfig {
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

/// Deterministic `base_delay * backoff_multiplier ^ attempt` schedule, capped at `max_delay`.
impl From<ReconnectConfig> for ExponentialBackoff {
    fn from(config: ReconnectConfig) -> Self {
        ExponentialBackoffBuilder::default()
            .with_initial_interval(config.base_delay)
            .with_max_interval(config.max_delay)
            .with_multiplier(config.backoff_multiplier)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None) // Attempts are capped by `max_attempts` instead
            .build()
    }
}

/// Callbacks and reconnect behavior for one session.
///
/// A session starts at [`ConnectionManager::connect`] and lasts until a disconnect or a
/// terminal error. Every reconnect spawned by the session reuses this exact configuration.
#[non_exhaustive]
#[derive(Clone, Default)]
pub struct SessionConfig {
    /// Reconnect after an abnormal close
    pub auto_reconnect: bool,
    pub reconnect: ReconnectConfig,
    pub on_open: Option<OpenHandler>,
    pub on_message: Option<MessageHandler>,
    pub on_close: Option<CloseHandler>,
    pub on_error: Option<ErrorHandler>,
}

impl SessionConfig {
    #[must_use]
    pub fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }

    /// Delay before the first reconnect attempt; later attempts grow from it.
    #[must_use]
    pub fn with_reconnect_delay(mut self, base_delay: Duration) -> Self {
        self.reconnect.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    #[must_use]
    pub fn on_open<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ConnectionManager) + Send + Sync + 'static,
    {
        self.on_open = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ConnectionManager, &Message) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_close<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ConnectionManager, &CloseFrame) + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ConnectionManager, &Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("auto_reconnect", &self.auto_reconnect)
            .field("reconnect", &self.reconnect)
            .field("on_open", &self.on_open.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
