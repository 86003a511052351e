//! Shared test utilities for assetsync crates
//!
//! This crate provides:
//! - **Fixtures**: Navlist response bodies and configuration maps
//! - **Mocks**: A mock Assets API server
//! - **Assertions**: Readers for the backup files a sync run produces
//!
//! # Example
//!
//! ```ignore
//! use assetsync_tests::{fixtures, mocks::MockAssetsApi};
//!
//! #[tokio::test]
//! async fn test_fetch() {
//!     let api = MockAssetsApi::start().await;
//!     api.mount_navlist(fixtures::navlist::object_entries(&[
//!         fixtures::navlist::entry(1, "Acme"),
//!     ]))
//!     .await;
//!
//!     let config = JiraConfig::from_lookup(fixtures::config::lookup(&api.uri()))?;
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mocks;

pub use mocks::MockAssetsApi;
