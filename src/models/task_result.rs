//! # Task Result Model
//!
//! Marks given to users for a task in a lesson. Stored in `user_mark` with a
//! unique key over `(user_id, task_id, lesson_id)`: a re-submitted mark
//! replaces the previous one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One user's mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserMark {
    pub user_id: Uuid,
    pub mark: i32,
}

/// Marks for one (task, lesson) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: Uuid,
    pub lesson_id: Uuid,
    pub users_mark: Vec<UserMark>,
}

impl TaskResult {
    pub fn new(task_id: Uuid, lesson_id: Uuid) -> Self {
        Self {
            task_id,
            lesson_id,
            users_mark: Vec::new(),
        }
    }

    pub fn with_mark(mut self, user_id: Uuid, mark: i32) -> Self {
        self.users_mark.push(UserMark { user_id, mark });
        self
    }

    /// One mark per user: a user listed more than once keeps the last mark,
    /// at the position of their first appearance.
    pub fn normalized(&self) -> TaskResult {
        let mut position: HashMap<Uuid, usize> = HashMap::with_capacity(self.users_mark.len());
        let mut users_mark: Vec<UserMark> = Vec::with_capacity(self.users_mark.len());

        for entry in &self.users_mark {
            match position.get(&entry.user_id) {
                Some(&idx) => users_mark[idx].mark = entry.mark,
                None => {
                    position.insert(entry.user_id, users_mark.len());
                    users_mark.push(*entry);
                }
            }
        }

        TaskResult {
            task_id: self.task_id,
            lesson_id: self.lesson_id,
            users_mark,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users_mark.is_empty()
    }
}
