//! HTTP surface: race listing routes plus liveness.

mod error;
mod middleware;
mod races;

pub use error::codes;
pub use middleware::RequestContext;
pub use races::{HttpState, build_router};
