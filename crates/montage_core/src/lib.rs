//! Core non-destructive editing model: validated time primitives, the
//! timeline entity model (clips + tagged overlays), pure edit operations,
//! and the persisted session format.

pub mod editing;
pub mod error;
pub mod persist;
pub mod types;
