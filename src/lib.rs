#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod error;
pub mod ws;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Close code reported for a normal, intentional closure. Any other code is abnormal.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when a connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Maximum number of records kept by a [`ws::log::MessageLog`].
pub const MESSAGE_LOG_CAPACITY: usize = 100;
