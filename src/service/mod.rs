//! Core components. Every function takes its store explicitly and the
//! current instant as an argument, so behaviour is reproducible in tests.

pub mod attendance;
pub mod reporting;
pub mod task_board;
pub mod time_session;
pub mod users;
