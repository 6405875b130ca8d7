//! Actor implementation of the session controller.
//!
//! ```text
//! SessionActorHandle (cloneable, presentation-facing)
//! └── SessionActor (one per controller instance)
//!     ├── owns lifecycle state, registry, roster, media state
//!     ├── consumes generation-tagged completions and stream events
//!     └── publishes SessionView over a watch channel
//! ```
//!
//! # Modules
//!
//! - [`messages`] - Message and view types exchanged with the actor
//! - [`metrics`] - Mailbox monitoring and session outcome counters
//! - [`session`] - The actor and its handle

pub mod messages;
pub mod metrics;
pub mod session;

pub use messages::{ConnectParams, ConnectionState, SessionMessage, SessionSnapshot, SessionView};
pub use metrics::{MailboxLevel, MailboxMonitor, SessionMetrics, SessionMetricsSnapshot};
pub use session::SessionActorHandle;
