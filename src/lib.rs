//! Workspace umbrella crate.
//!
//! Re-exports the core crates behind feature flags so host applications can
//! depend on `tunedeck-workspace` alone instead of wiring `core-runtime`,
//! `core-catalog`, `core-session`, `core-playback` and a bridge crate
//! individually. The `desktop-shims` feature (on by default) pulls in the
//! reqwest/SQLite bridge implementations for native hosts.

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
#[cfg(feature = "desktop-shims")]
pub use core_catalog;
#[cfg(feature = "desktop-shims")]
pub use core_playback;
#[cfg(feature = "desktop-shims")]
pub use core_runtime;
#[cfg(feature = "desktop-shims")]
pub use core_session;
