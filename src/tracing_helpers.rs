//! Logging macros that cost nothing unless the `tracing` feature is enabled.
//!
//! With the feature on they forward to the `tracing` crate. The crate installs
//! no subscriber; the application has to set one up (for example
//! `tracing-subscriber` with its env-filter) before rotations and rejected
//! handles show up anywhere.
//!
//! Fields passed to these macros must not depend on the tree's key or value
//! types; the tree places no `Debug` bound on them.

#![allow(unused_macros)]

/// Trace-level logging.
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

/// Debug-level logging.
#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Warn-level logging.
#[cfg(feature = "tracing")]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        tracing::warn!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_log {
    ($($arg:tt)*) => {};
}
