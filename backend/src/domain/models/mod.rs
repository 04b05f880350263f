//! Domain error types and business constants.
//!
//! Rejections are typed so the calling layer can tell user mistakes apart from
//! storage failures, which arrive wrapped in the `Storage` variants.

pub mod habit;
pub mod save;
pub mod upgrade;

pub use habit::*;
pub use save::*;
pub use upgrade::*;
