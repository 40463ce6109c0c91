//! Core infrastructure for opcache-toolkit.
//!
//! This crate provides functionality shared by every toolkit component:
//! - Event system for observability
//! - The unified [`ToolkitError`] taxonomy
//! - A [`Clock`] abstraction so timing can be substituted in tests
//! - A [`Cancellation`] signal checked between retry attempts

pub mod cancel;
pub mod clock;
pub mod error;
pub mod events;

pub use cancel::{CancelHandle, Cancellation};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{ConfigError, ToolkitError};
pub use events::{
    Component, EventListener, EventListeners, EventRecorder, FnListener, ToolkitEvent,
};
