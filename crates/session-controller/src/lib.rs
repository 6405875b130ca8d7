//! Parley Session Controller
//!
//! Client-side controller that drives an external transport engine through
//! the life of a meeting session: authenticate, join, media bring-up, stream
//! reconciliation, exit. The presentation layer renders exclusively from the
//! state this crate owns and publishes.
//!
//! - Sequences connect and join, surfacing failures without automatic retry
//! - Owns the insertion-ordered stream registry, including dedup of the
//!   server's echo of the local stream
//! - Tracks the participant roster from audio stream announcements
//! - Guards media toggles against double-invocation while a transport round
//!   trip is pending
//! - Publishes every observable state change over a watch channel
//!
//! # Architecture
//!
//! ```text
//! SessionActorHandle (cloneable API for the presentation layer)
//! └── SessionActor (single owner of session state)
//!     ├── lifecycle: Idle → Connecting → JoiningMeeting → InMeeting
//!     ├── StreamRegistry (rendering order, dedup rules)
//!     ├── ParticipantRoster (announcement order)
//!     └── MediaControlState (toggle intent, in-flight guard)
//!           │
//!           ▼
//!     TransportClient (object-safe trait over the external engine)
//! ```
//!
//! Transport completions and stream events re-enter the actor mailbox tagged
//! with the generation of the connect attempt that issued them; anything
//! from an abandoned attempt is discarded, never errored on. No ordering is
//! assumed between transport channels.
//!
//! # Modules
//!
//! - [`actor`] - The session actor, its messages and metrics
//! - [`config`] - Configuration from environment variables
//! - [`errors`] - Error types with metric labels and client messages
//! - [`media`] - Local media toggle state
//! - [`observability`] - Tracing setup and metric helpers
//! - [`registry`] - Insertion-ordered stream registry
//! - [`roster`] - Participant roster
//! - [`transport`] - Contract with the external transport engine

pub mod actor;
pub mod config;
pub mod errors;
pub mod media;
pub mod observability;
pub mod registry;
pub mod roster;
pub mod transport;

pub use actor::{ConnectParams, ConnectionState, SessionActorHandle, SessionSnapshot, SessionView};
pub use config::Config;
pub use errors::SessionError;
pub use media::MediaControlState;
pub use registry::{StreamDescriptor, StreamRegistry};
pub use roster::{ParticipantInfo, ParticipantRoster};
pub use transport::{StreamEvent, TransportClient, TransportError};
