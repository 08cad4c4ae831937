//! Tasks, subtasks and comments
//!
//! - **Entities**: `Task`, `Subtask`, `Comment`, `TaskStatus`, `TaskPriority`
//! - **Projections**: `TaskBrief`, `TaskListItem`, `TaskDetail`, `TaskView`, `ProjectTasks`
//! - **Repository**: `TaskRepository` for database operations

pub mod entity;
pub mod repository;

pub use entity::{
    Comment, ProjectTasks, Subtask, Task, TaskBrief, TaskDeleted, TaskDetail, TaskListItem,
    TaskPriority, TaskStatus, TaskView,
};
pub use repository::TaskRepository;
