//! Shared data models for the tubeinfo service.
//!
//! This crate provides Serde-serializable types for:
//! - Validated video and playlist identifiers
//! - Media renditions and single-video summaries
//! - Playlist summaries and lightweight video references
//! - Canonical YouTube URLs derived from identifiers

pub mod identifier;
pub mod media;
pub mod playlist;
pub mod urls;

// Re-export common types
pub use identifier::{IdentifierError, PlaylistId, VideoId};
pub use media::{MediaItemSummary, MediaRendition};
pub use playlist::{PlaylistSummary, VideoReference};
