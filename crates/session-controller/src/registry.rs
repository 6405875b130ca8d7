//! Insertion-ordered registry of active stream descriptors.
//!
//! The registry is the single source of truth for what the presentation
//! layer renders. Order is meaningful: descriptors keep the position they
//! were inserted at for their whole lifetime, removal never reorders the
//! survivors and replacement swaps in place. Tiles on screen therefore never
//! jump around when streams come and go.
//!
//! The id `"local"` is reserved for the locally-captured feed. It acts as a
//! placeholder until the server echoes the same stream back under its own
//! id, at which point the echo replaces the placeholder in place (see the
//! session actor's dedup handling).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::types::{MediaHandle, StreamId};

/// Errors from registry mutations.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A descriptor with this id is already registered.
    #[error("stream {0} is already registered")]
    DuplicateStream(StreamId),

    /// No descriptor with this id to replace.
    #[error("stream {0} is not registered")]
    UnknownStream(StreamId),
}

/// One active video feed and the metadata needed to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream id, unique within the registry. `"local"` is reserved for the
    /// local capture placeholder.
    pub id: StreamId,
    /// Email of the owning participant; may be empty.
    pub participant_email: String,
    /// Display name of the owning participant.
    pub participant_name: String,
    /// Camera label, when the transport announced one.
    pub camera_label: Option<String>,
    /// True for screen-share feeds.
    pub is_screen_share: bool,
    /// Handle to the live stream. The handle is a reference; the stream
    /// itself stays with the transport.
    pub media_handle: MediaHandle,
}

/// Insertion-ordered collection of stream descriptors, at most one per id.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: Vec<StreamDescriptor>,
}

impl StreamRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// True when a descriptor with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &StreamId) -> bool {
        self.streams.iter().any(|d| d.id == *id)
    }

    /// Borrow the descriptor with `id`.
    #[must_use]
    pub fn get(&self, id: &StreamId) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|d| d.id == *id)
    }

    /// Register a descriptor at the end of the rendering order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateStream`] when a descriptor with the
    /// same id is already registered.
    pub fn insert(&mut self, descriptor: StreamDescriptor) -> Result<(), RegistryError> {
        if self.contains(&descriptor.id) {
            return Err(RegistryError::DuplicateStream(descriptor.id));
        }
        self.streams.push(descriptor);
        Ok(())
    }

    /// Remove the descriptor with `id`, returning it.
    ///
    /// Removing an absent id yields `None` and changes nothing; removal
    /// notifications may describe streams that were never activated.
    pub fn remove(&mut self, id: &StreamId) -> Option<StreamDescriptor> {
        let index = self.streams.iter().position(|d| d.id == *id)?;
        Some(self.streams.remove(index))
    }

    /// Replace the descriptor registered under `old_id` with `descriptor`,
    /// keeping its position in the rendering order.
    ///
    /// The caller decides what carries over into the replacement; the dedup
    /// path builds `descriptor` around the old entry's media handle so the
    /// capture is never requested twice.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownStream`] when `old_id` is absent, or
    /// [`RegistryError::DuplicateStream`] when `descriptor.id` is already
    /// registered at another position.
    pub fn replace(
        &mut self,
        old_id: &StreamId,
        descriptor: StreamDescriptor,
    ) -> Result<(), RegistryError> {
        if descriptor.id != *old_id && self.contains(&descriptor.id) {
            return Err(RegistryError::DuplicateStream(descriptor.id));
        }
        let Some(slot) = self.streams.iter_mut().find(|d| d.id == *old_id) else {
            return Err(RegistryError::UnknownStream(old_id.clone()));
        };
        *slot = descriptor;
        Ok(())
    }

    /// Snapshot of all descriptors in rendering order.
    #[must_use]
    pub fn list(&self) -> Vec<StreamDescriptor> {
        self.streams.clone()
    }

    /// Iterate descriptors in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter()
    }

    /// Drop every descriptor. Handles inside the dropped descriptors are
    /// references; releasing the underlying streams is the transport's job.
    pub fn clear(&mut self) {
        self.streams.clear();
    }
}
