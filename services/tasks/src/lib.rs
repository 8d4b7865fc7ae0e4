//! Task models and the multi-view task synchronizer

pub mod models;
pub mod sync;
pub mod view;

pub use models::{NewTask, Task, TaskDraft, TaskFile, TaskPatch};
pub use sync::TaskSynchronizer;
pub use view::{Operation, TaskView, TaskViewSet};
