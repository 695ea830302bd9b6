//! Encrypted-media types shared with the decryption collaborator

/// Format of the initialization data passed to a key system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaKeyInitDataType {
    #[default]
    Cenc,
    KeyIds,
    WebM,
}

/// Whether a key-system feature is needed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaKeysRequirement {
    Required,
    #[default]
    Optional,
    NotAllowed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaKeySessionType {
    #[default]
    Temporary,
    PersistentLicense,
}

/// The part of a key system the playback engine talks to
///
/// The engine only needs to know whether a frame can be decrypted; license
/// exchange and the decryption itself stay with the implementation.
pub trait EmeImplementation: Send + Sync {
    /// Whether a usable key for `key_id` is currently loaded
    fn has_key(&self, key_id: &[u8]) -> bool;
}
