//! Workspace facade crate.
//!
//! Re-exports the narration core together with the runtime and bridge crates so
//! host applications can depend on `narrator-workspace` and pick a platform via
//! feature flags (`desktop`, `native-audio`) instead of wiring each crate.

pub use bridge_traits;
pub use core_narration;
pub use core_runtime;

#[cfg(feature = "desktop")]
pub use bridge_desktop;
