//! Task views and synchronizer operations

use common::Endpoints;
use std::fmt;

use crate::models::Task;

/// One of the four task collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskView {
    /// Every task visible to the user
    All,
    /// Tasks addressed to the user
    Mine,
    /// Tasks the user sent
    Created,
    /// Tasks addressed to the user and completed
    Completed,
}

impl TaskView {
    pub const ALL: [TaskView; 4] = [
        TaskView::All,
        TaskView::Mine,
        TaskView::Created,
        TaskView::Completed,
    ];

    /// Views whose membership an edit or delete can change
    pub const EDITABLE: [TaskView; 3] = [TaskView::All, TaskView::Mine, TaskView::Created];

    pub fn endpoint(self, endpoints: &Endpoints) -> &str {
        match self {
            TaskView::All => &endpoints.tasks,
            TaskView::Mine => &endpoints.tasks_mine,
            TaskView::Created => &endpoints.tasks_created,
            TaskView::Completed => &endpoints.tasks_completed,
        }
    }

    /// Busy flag covering a fetch of this view
    pub fn fetch_operation(self) -> Operation {
        match self {
            TaskView::All => Operation::FetchAll,
            TaskView::Mine => Operation::FetchMine,
            TaskView::Created => Operation::FetchCreated,
            TaskView::Completed => Operation::FetchCompleted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskView::All => "all",
            TaskView::Mine => "mine",
            TaskView::Created => "created",
            TaskView::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Logical operation tracked by a busy flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    FetchMine,
    FetchCreated,
    FetchCompleted,
    Create,
    Update,
    Remove,
    Complete,
}

impl Operation {
    pub const COUNT: usize = 8;

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// The four task collections
///
/// Views overlap and are not normalized: the same task may appear in several
/// of them, each copy as fresh as the last fetch of that view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskViewSet {
    pub all: Vec<Task>,
    pub mine: Vec<Task>,
    pub created: Vec<Task>,
    pub completed: Vec<Task>,
}

impl TaskViewSet {
    pub fn get(&self, view: TaskView) -> &[Task] {
        match view {
            TaskView::All => &self.all,
            TaskView::Mine => &self.mine,
            TaskView::Created => &self.created,
            TaskView::Completed => &self.completed,
        }
    }

    pub fn replace(&mut self, view: TaskView, tasks: Vec<Task>) {
        let slot = match view {
            TaskView::All => &mut self.all,
            TaskView::Mine => &mut self.mine,
            TaskView::Created => &mut self.created,
            TaskView::Completed => &mut self.completed,
        };
        *slot = tasks;
    }
}
