//! Shared task registry.
//!
//! One long-lived registry is shared by the HTTP surface and all workers.
//! Each task has a single writer: the worker processing it. Readers only
//! ever see a snapshot of the record.

use crate::domain::task::{Task, TaskKind};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh Pending task and return its id.
    pub async fn create(&self, kind: TaskKind, message: impl Into<String>) -> String {
        let task_id = Uuid::new_v4().to_string();
        let task = Task::new(task_id.clone(), kind, message.into());
        self.tasks.write().await.insert(task_id.clone(), task);
        task_id
    }

    /// Snapshot of a task record, if it exists.
    pub async fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Apply a mutation to a task record. No-op for unknown ids. Bumps
    /// `updated_at`.
    pub async fn update(&self, task_id: &str, apply: impl FnOnce(&mut Task)) {
        if let Some(task) = self.tasks.write().await.get_mut(task_id) {
            apply(task);
            task.updated_at = Utc::now();
        }
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskStatus;

    #[tokio::test]
    async fn create_then_get_returns_a_pending_task() {
        let registry = TaskRegistry::new();
        let id = registry.create(TaskKind::Clip, "Clip task created").await;
        let task = registry.get(&id).await.unwrap();
        assert_eq!(task.task_id, id);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let registry = TaskRegistry::new();
        let a = registry.create(TaskKind::Clip, "a").await;
        let b = registry.create(TaskKind::Clip, "b").await;
        assert_ne!(a, b);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn update_mutates_and_bumps_updated_at() {
        let registry = TaskRegistry::new();
        let id = registry.create(TaskKind::Merge, "created").await;
        let before = registry.get(&id).await.unwrap().updated_at;

        registry
            .update(&id, |t| t.start_processing("Processing clips..."))
            .await;

        let task = registry.get(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.message, "Processing clips...");
        assert!(task.updated_at >= before);
    }

    #[tokio::test]
    async fn unknown_ids_are_handled() {
        let registry = TaskRegistry::new();
        assert!(registry.get("nope").await.is_none());
        // Update of an unknown id must not panic or create a record.
        registry.update("nope", |t| t.fail("x", "x")).await;
        assert_eq!(registry.len().await, 0);
    }
}
