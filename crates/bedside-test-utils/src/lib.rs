#![deny(unsafe_code)]

//! Shared test utilities for the Bedside workspace.
//!
//! Provides a scriptable completion client, config builders, and temp config
//! files so that individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! bedside-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod session;
pub mod stub;

pub use config::{TempConfig, TestConfigBuilder};
pub use session::test_session;
pub use stub::StubCompletionClient;
