//! Application services layer.

pub mod error;
pub mod races;
pub mod sources;
