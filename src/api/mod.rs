pub mod attendance;
pub mod report;
pub mod task;
pub mod time_log;
pub mod user;
