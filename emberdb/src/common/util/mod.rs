mod task_util;

pub use task_util::*;
