//! Application services orchestrating domain rules over the persistence ports.

pub mod error;
pub mod posts;
pub mod repos;
