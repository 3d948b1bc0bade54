//! Logging abstraction
//!
//! Provides logging macros that work across targets:
//! - Embedded (`defmt` feature): forwards to `defmt`
//! - Host (`std` feature): prints with a level prefix
//! - Otherwise: no-op
//!
//! Arguments must satisfy both `core::fmt::Display` and `defmt::Format`, which
//! is why errors are logged through their `as_str()` descriptions.

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), feature = "std"))]
        ::std::println!("[INFO] {}", ::std::format!($($arg)*));
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), feature = "std"))]
        ::std::println!("[WARN] {}", ::std::format!($($arg)*));
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), feature = "std"))]
        ::std::eprintln!("[ERROR] {}", ::std::format!($($arg)*));
    }};
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), feature = "std"))]
        ::std::println!("[DEBUG] {}", ::std::format!($($arg)*));
    }};
}
