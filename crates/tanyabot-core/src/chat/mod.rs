//! Conversation orchestration: the durable-store trait and the converse
//! pipeline that sequences rewriting, retrieval, generation, persistence,
//! and popularity tracking.

pub mod repository;
pub mod service;
