//! Projects and their memberships
//!
//! - **Entities**: `Project`, `ProjectMember`, `ProjectRole`, `ProjectStatus`
//! - **Projections**: `ProjectSummary`, `ProjectDetail`, `ProjectWithMembers`
//! - **Repository**: `ProjectRepository` for database operations

pub mod entity;
pub mod repository;

pub use entity::{
    MemberInput, Project, ProjectDetail, ProjectMember, ProjectRole, ProjectStatus,
    ProjectSummary, ProjectWithMembers,
};
pub use repository::ProjectRepository;
