//! Domain layer
//!
//! Entities, repositories and the rules that sit directly on top of them.

pub mod access;
pub mod activity;
pub mod project;
pub mod stats;
pub mod task;
pub mod user;
