//! The `Config` handle threaded through every public entry point (§6).

use std::sync::Arc;

use crate::alloc::{Allocator, NullAllocator};

/// Diagnostic severity passed to `log_fn`, and also used to gate the ambient
/// `log` crate facade (see SPEC_FULL.md's AMBIENT STACK section).
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum LogLevel {
    /// Verbose internal tracing.
    Debug,
    /// Informational notices.
    Info,
    /// Notable but non-erroneous conditions.
    #[default]
    Notice,
    /// Recoverable anomalies (e.g. an ignored unknown key).
    Warning,
    /// The condition that is about to be returned as an `Err`.
    Error,
}

/// Flags affecting load behavior.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConfigFlags {
    /// Unknown mapping keys are silently consumed instead of erroring.
    pub ignore_unknown_keys: bool,
}

/// Flags affecting save behavior. Currently empty; kept `#[non_exhaustive]`
/// so `save_data`'s entry contract stays symmetric with load's without a
/// breaking change when a flag is added.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct SaveFlags {}

/// The config handle threaded through every public call.
#[derive(Clone)]
#[non_exhaustive]
pub struct Config {
    /// Receives diagnostic text; `None` disables the callback entirely
    /// (ambient `log` crate output, if any, is unaffected).
    pub log_fn: Option<Arc<dyn Fn(LogLevel, &str) + Send + Sync>>,
    /// The minimum severity forwarded to `log_fn`.
    pub log_level: LogLevel,
    /// The allocation-tracking hook (§4.2).
    pub allocator: Arc<dyn Allocator>,
    /// Load-affecting flags.
    pub flags: ConfigFlags,
    /// Recursion guard for the Load engine; exceeding this depth surfaces
    /// `CyamlError::InternalError` rather than overflowing the call stack.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_fn: None,
            log_level: LogLevel::Warning,
            allocator: Arc::new(NullAllocator),
            flags: ConfigFlags::default(),
            max_depth: 256,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("log_fn", &self.log_fn.is_some())
            .field("log_level", &self.log_level)
            .field("flags", &self.flags)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl Config {
    /// Route a diagnostic through both `log_fn` (if set and severe enough)
    /// and the ambient `log` crate facade.
    pub(crate) fn diagnostic(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => log::debug!("{message}"),
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Notice => log::info!("{message}"),
            LogLevel::Warning => log::warn!("{message}"),
            LogLevel::Error => log::error!("{message}"),
        }
        if level >= self.log_level {
            if let Some(f) = &self.log_fn {
                f(level, message);
            }
        }
    }
}
