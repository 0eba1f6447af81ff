//! HTTP surface: chat streaming, the agent gateway and health

pub mod handlers;
pub mod router;
pub mod state;

pub use router::{build_router, serve};
pub use state::AppState;
