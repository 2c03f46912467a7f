//! Request handlers.

pub mod diagnostics;
pub mod fallback;
pub mod health;
pub mod playlists;
pub mod videos;

pub use diagnostics::*;
pub use fallback::*;
pub use health::*;
pub use playlists::*;
pub use videos::*;
