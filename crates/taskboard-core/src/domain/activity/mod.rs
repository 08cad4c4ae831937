//! Append-only activity log
//!
//! Entries reference their subject weakly, so the history of a deleted task
//! stays readable.

pub mod entity;
pub mod repository;

pub use entity::{ActivityAction, ActivityEntry, Actor, EntityType, preview};
pub use repository::ActivityRepository;
