//! Task view synchronization
//!
//! [`TaskSynchronizer`] keeps the four task views and, after every mutation,
//! refetches each view whose membership the mutation could have changed:
//!
//! | Operation  | Refetched views              |
//! |------------|------------------------------|
//! | `create`   | created                      |
//! | `update`   | all, mine, created           |
//! | `remove`   | all, mine, created           |
//! | `complete` | all, mine, created, completed |
//!
//! Refetches run in parallel and finish before the mutation resolves. A
//! refetch failure is logged and leaves that view stale; it never fails the
//! mutation.

use auth::ApiClient;
use common::{ClientResult, Endpoints};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::models::{Task, TaskDraft, TaskPatch};
use crate::view::{Operation, TaskView, TaskViewSet};

/// Marks an operation busy until dropped
struct BusyGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Holds the task views and the operations that keep them current
pub struct TaskSynchronizer {
    client: Arc<ApiClient>,
    views: RwLock<TaskViewSet>,
    busy: [AtomicUsize; Operation::COUNT],
}

impl TaskSynchronizer {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            views: RwLock::new(TaskViewSet::default()),
            busy: std::array::from_fn(|_| AtomicUsize::new(0)),
        }
    }

    fn endpoints(&self) -> &Endpoints {
        &self.client.config().endpoints
    }

    fn mark_busy(&self, operation: Operation) -> BusyGuard<'_> {
        BusyGuard::enter(&self.busy[operation.index()])
    }

    /// Current contents of one view
    pub async fn view(&self, view: TaskView) -> Vec<Task> {
        self.views.read().await.get(view).to_vec()
    }

    /// Copy of all four views
    pub async fn snapshot(&self) -> TaskViewSet {
        self.views.read().await.clone()
    }

    pub fn is_busy(&self, operation: Operation) -> bool {
        self.busy[operation.index()].load(Ordering::Acquire) > 0
    }

    /// True while any operation is in flight
    pub fn is_loading(&self) -> bool {
        self.busy
            .iter()
            .any(|counter| counter.load(Ordering::Acquire) > 0)
    }

    /// Fetch one view and replace its contents
    ///
    /// On failure the previous contents are kept.
    pub async fn fetch(&self, view: TaskView) -> ClientResult<()> {
        let _busy = self.mark_busy(view.fetch_operation());

        let tasks: Vec<Task> = self
            .client
            .get_json(view.endpoint(self.endpoints()))
            .await
            .inspect_err(|e| error!("Failed to fetch {} tasks: {}", view, e))?;

        debug!("Fetched {} tasks for view {}", tasks.len(), view);
        self.views.write().await.replace(view, tasks);
        Ok(())
    }

    /// Fetch all four views in parallel
    ///
    /// Every fetch runs to completion; the first failure is returned.
    pub async fn refresh_all(&self) -> ClientResult<()> {
        let results = join_all(TaskView::ALL.map(|view| self.fetch(view))).await;
        results.into_iter().collect()
    }

    /// Create a task and refetch the created view
    pub async fn create(&self, draft: TaskDraft) -> ClientResult<Task> {
        let _busy = self.mark_busy(Operation::Create);

        let body = draft.into_new_task();
        let task: Task = self
            .client
            .post_json(&self.endpoints().tasks_created, &body)
            .await
            .inspect_err(|e| error!("Failed to create task {}: {}", body.name, e))?;

        info!("Created task {}", task.id);
        self.refetch(&[TaskView::Created]).await;
        Ok(task)
    }

    /// Edit a task and refetch the views an edit can affect
    ///
    /// Any success status counts as applied. The service trims the response
    /// for some callers (a recipient gets no name, sender or timestamps back),
    /// so the updated task is returned only when the body is a full task.
    pub async fn update(&self, id: i64, patch: &TaskPatch) -> ClientResult<Option<Task>> {
        let _busy = self.mark_busy(Operation::Update);

        let body: Value = self
            .client
            .patch_json(&self.endpoints().task_detail(id), patch)
            .await
            .inspect_err(|e| error!("Failed to update task {}: {}", id, e))?;

        info!("Updated task {}", id);
        self.refetch(&TaskView::EDITABLE).await;

        let task = serde_json::from_value::<Task>(body)
            .inspect_err(|e| debug!("Update of task {} returned a partial task: {}", id, e))
            .ok();
        Ok(task)
    }

    /// Delete a task and refetch the views a deletion can affect
    pub async fn remove(&self, id: i64) -> ClientResult<()> {
        let _busy = self.mark_busy(Operation::Remove);

        self.client
            .delete(&self.endpoints().task_detail(id))
            .await
            .inspect_err(|e| error!("Failed to delete task {}: {}", id, e))?;

        info!("Deleted task {}", id);
        self.refetch(&TaskView::EDITABLE).await;
        Ok(())
    }

    /// Mark a task complete and refetch every view
    pub async fn complete(&self, id: i64) -> ClientResult<Task> {
        let _busy = self.mark_busy(Operation::Complete);

        let task: Task = self
            .client
            .post_empty(&self.endpoints().task_complete(id))
            .await
            .inspect_err(|e| error!("Failed to complete task {}: {}", id, e))?;

        info!("Completed task {}", id);
        self.refetch(&TaskView::ALL).await;
        Ok(task)
    }

    async fn refetch(&self, views: &[TaskView]) {
        let results = join_all(views.iter().map(|&view| async move {
            (view, self.fetch(view).await)
        }))
        .await;

        for (view, result) in results {
            if let Err(e) = result {
                warn!("View {} left stale after refetch failure: {}", view, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_releases_on_drop() {
        let counter = AtomicUsize::new(0);
        {
            let _outer = BusyGuard::enter(&counter);
            let _inner = BusyGuard::enter(&counter);
            assert_eq!(counter.load(Ordering::Acquire), 2);
        }
        assert_eq!(counter.load(Ordering::Acquire), 0);
    }
}
