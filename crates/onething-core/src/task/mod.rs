//! Task catalog, daily condition, and the recommendation store.

mod catalog;
mod condition;
mod model;
mod store;

pub use catalog::default_tasks;
pub use condition::ConditionLevel;
pub use model::{Difficulty, NewTask, Task, TaskCategory};
pub use store::{TaskState, TaskStore, TASKS_KEY};
