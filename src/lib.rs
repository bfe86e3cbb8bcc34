//! # sysknobs
//!
//! Sysfs-style control surface exposing two unrelated tunable groups:
//!
//! - **`soundcontrol`**: four signed audio gain offsets (headphones,
//!   headset, speaker, mic), clamped to [-20, 20], read by an external
//!   audio driver.
//! - **`dyn_fsync`**: a toggle deferring filesystem sync during the
//!   screen-off power window, flushing outstanding writeback when the
//!   window opens.
//!
//! **Architecture:** components own their state and publish named attribute
//! groups through the [`attr::AttrPublisher`] capability; an axum router
//! serves the registry and injects suspend/resume events.

pub mod api;
pub mod attr;
pub mod config;
pub mod error;
pub mod fsync;
pub mod power;
pub mod sound;

pub use error::{Error, Result};
