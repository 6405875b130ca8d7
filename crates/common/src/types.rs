//! Common data types for Parley components.

use serde::{Deserialize, Serialize};

use crate::secret::{ExposeSecret, SecretString};

/// Identifier of the meeting a session targets.
///
/// Meeting ids are opaque user-entered strings; the controller only checks
/// non-emptiness before handing them to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeetingId(String);

impl MeetingId {
    /// Create a meeting id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for MeetingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single audio or video stream within a meeting.
///
/// Stream ids are assigned by the transport, except for the reserved
/// [`StreamId::local`] placeholder naming the locally-captured video feed
/// until the server echoes it back under a server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(String);

impl StreamId {
    /// Reserved id of the local capture placeholder.
    pub const LOCAL: &'static str = "local";

    /// Create a stream id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved placeholder id for the locally-captured feed.
    #[must_use]
    pub fn local() -> Self {
        Self(Self::LOCAL.to_string())
    }

    /// True for the reserved local placeholder id.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0 == Self::LOCAL
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capture device selector, passed through to local-video enables unchanged.
///
/// Switching devices while video is enabled requires an explicit
/// disable/enable cycle; the transport offers no atomic device swap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DeviceId {
    /// The transport's own default capture device.
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a live media stream owned by the transport.
///
/// The registry carries handles, it never owns the streams behind them:
/// cloning or dropping a handle neither acquires nor releases anything.
/// Streams are released exclusively through the transport's own
/// disable/disconnect operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaHandle(String);

impl MediaHandle {
    /// Wrap a transport-issued stream token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the transport-issued token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Login credentials for the authenticate call.
///
/// Both fields may be empty: the transport treats an empty email and password
/// as a guest login. The password is a [`SecretString`], so derived `Debug`
/// output is redacted.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Account email, or empty for guest mode.
    pub email: String,
    /// Account password, or empty for guest mode.
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from an email and password.
    #[must_use]
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    /// Guest-mode credentials: empty email and password.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            email: String::new(),
            password: SecretString::from(""),
        }
    }

    /// True when both email and password are empty.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.email.is_empty() && self.password.expose_secret().is_empty()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::guest()
    }
}
