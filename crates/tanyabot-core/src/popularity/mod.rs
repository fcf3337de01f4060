//! Best-effort popularity tracking for asked questions.
//!
//! Runs as a detached background task after a conversation turn; its
//! failures never reach the user-facing reply.

pub mod repository;
pub mod tracker;
