pub mod api;
pub mod board;
pub mod metrics;
pub mod state;
