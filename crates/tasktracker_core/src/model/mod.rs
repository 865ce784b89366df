mod task;

pub use task::{DATE_FORMAT, Task, TaskStatus, parse_date};
