//! # Session Controller Test Utilities
//!
//! Shared test utilities for the Parley session controller.
//!
//! This crate provides a scripted transport double and test fixtures for
//! exercising the controller without a real transport engine.
//!
//! ## Modules
//!
//! - `mock_transport` - Scripted in-memory transport client
//! - `fixtures` - Pre-configured connect parameters, stream announcements
//!   and session helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     // Script a transport and drive a guest into a meeting
//!     let transport = Arc::new(MockTransport::new());
//!     let handle = join_guest_session(Arc::clone(&transport), "m1", "Alice").await;
//!
//!     // Announce a remote stream and wait for it to render
//!     transport.push_video_added(camera_stream("r1", "Carol")).await;
//!     wait_for_view(&handle, |view| view.streams.len() == 2).await;
//! }
//! ```
//!
//! ## Hold Gates
//!
//! Ordering-sensitive tests park a transport call mid-flight:
//!
//! ```rust,ignore
//! let transport = Arc::new(MockTransport::new().with_held_join());
//! // ... start a connect, then:
//! transport.wait_for_join_calls(1).await;
//! // the join is now in flight; exit, push events, etc.
//! transport.release_join();
//! ```

pub mod fixtures;
pub mod mock_transport;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_transport::*;
