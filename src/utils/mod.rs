pub mod email_index;
pub mod time_window;
