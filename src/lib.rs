//! AI-assisted action planning for Microsoft Teams channels.
//!
//! Fetches recent channel messages via Microsoft Graph, derives prioritized
//! follow-up actions through a pluggable analyzer (OpenAI-backed or
//! deterministic keyword rules), and optionally posts suggested follow-ups
//! back to the channel.

pub mod analyzers;
pub mod config;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod planner;
pub mod types;
