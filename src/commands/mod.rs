pub mod config;
pub mod day;
pub mod refresh;
pub mod show;
pub mod watch;
