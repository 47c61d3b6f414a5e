//! Dashboard routes

pub mod alerts;
pub mod live;
pub mod recorded;
pub mod session;
