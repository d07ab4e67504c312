//! Pairing of incoming connections into rooms

pub mod service;

pub use service::{Assignment, MatchmakingService};
