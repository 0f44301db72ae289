//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stores key their documents by this identifier; it never changes for the
/// lifetime of the record.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
