pub mod access;
pub mod auth;
pub mod rate_limit;
pub mod registry;
pub mod stats;
pub mod tracker;
