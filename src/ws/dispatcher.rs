use std::sync::Arc;

use super::config::SessionConfig;
use super::connection::ConnectionManager;
use super::event::CloseFrame;
use super::log::Message;
use crate::error::Error;

/// The address and configuration captured by one `connect` call.
///
/// Cloning is cheap; a clone is taken before invoking a callback so the callback can
/// borrow the manager mutably.
#[derive(Clone, Debug)]
pub(crate) struct EventDispatcher {
    address: Arc<str>,
    config: Arc<SessionConfig>,
}

impl EventDispatcher {
    pub(crate) fn new(address: String, config: SessionConfig) -> Self {
        Self {
            address: address.into(),
            config: Arc::new(config),
        }
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn auto_reconnect(&self) -> bool {
        self.config.auto_reconnect
    }

    pub(crate) fn open(&self, manager: &mut ConnectionManager) {
        if let Some(handler) = &self.config.on_open {
            handler(manager);
        }
    }

    pub(crate) fn message(&self, manager: &mut ConnectionManager, message: &Message) {
        if let Some(handler) = &self.config.on_message {
            handler(manager, message);
        }
    }

    pub(crate) fn close(&self, manager: &mut ConnectionManager, frame: &CloseFrame) {
        if let Some(handler) = &self.config.on_close {
            handler(manager, frame);
        }
    }

    pub(crate) fn error(&self, manager: &mut ConnectionManager, error: &Error) {
        if let Some(handler) = &self.config.on_error {
            handler(manager, error);
        }
    }
}
