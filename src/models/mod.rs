//! # Entity Model
//!
//! Value types shared by the store, cache and event ports.
//!
//! - [`task`] - reusable task templates
//! - [`assignment`] - bindings of a task to a (class, lesson) pair
//! - [`task_result`] - per-user marks for a task in a lesson

pub mod assignment;
pub mod task;
pub mod task_result;

pub use assignment::{
    Assignment, AssignmentUpdate, ClassLesson, CreatedAssignment, NewTaskWithAssignment,
};
pub use task::{NewTask, Task};
pub use task_result::{TaskResult, UserMark};
