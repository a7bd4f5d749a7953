//! Gesture, slider and doze-sensor dispatch for vendor touchpanels.

pub mod android;
pub mod classifier;
pub mod clock;
pub mod collab;
pub mod config;
pub mod debounce;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod gesture_nodes;
pub mod handler;
pub mod hold;
pub mod input;
pub mod key_gate;
pub mod keys;
pub mod media_keys;
pub mod queue;
pub mod screen;
pub mod sensors;
pub mod settings;
pub mod settings_watch;
pub mod state;
pub mod sysfs;
pub mod web;

pub use error::{Error, Result};
