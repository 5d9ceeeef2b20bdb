//! Domain layer types and invariants.

pub mod collate;
pub mod dates;
pub mod error;
pub mod fallback;
pub mod normalize;
pub mod races;
pub mod status;
