//! Shared domain types for TanyaBot.
//!
//! This crate contains the core domain types used across the TanyaBot
//! backend: Session, Turn, PopularPrompt, retrieval types, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod prompt;
pub mod retrieval;
