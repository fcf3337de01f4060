//! External vector-search clients.

pub mod postgrest;

pub use postgrest::PostgrestPassageSearch;
