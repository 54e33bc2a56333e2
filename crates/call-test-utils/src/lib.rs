//! # Call Test Utilities
//!
//! Shared test utilities for the call session.
//!
//! This crate provides a scripted engine and test fixtures for exercising a
//! `CallSession` without a real call engine.
//!
//! ## Modules
//!
//! - `mock_engine` - Scripted engine implementing every engine seam
//! - `fixtures` - Participant, page and call state builders
//!
//! ## Usage
//!
//! ```rust,ignore
//! use call_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let engine = MockEngine::builder()
//!         .with_page(TestPage::new(vec![TestParticipant::new(2).build()]).build())
//!         .build();
//!
//!     let (handle, engine_tx, _task) = CallSession::spawn(
//!         SessionId::new(),
//!         TestCallState::new(1).build(),
//!         engine.services(),
//!         &Config::default(),
//!         CancellationToken::new(),
//!     );
//!
//!     // Push engine updates through engine_tx, drive the handle...
//! }
//! ```

pub mod fixtures;
pub mod mock_engine;

pub use fixtures::*;
pub use mock_engine::*;
