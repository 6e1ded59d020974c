pub mod task;
pub mod user;

pub use task::{CreateTaskRequest, Task, TaskQuery, UpdateTaskRequest};
pub use user::{NewUser, User};
