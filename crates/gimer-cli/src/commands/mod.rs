pub mod config;
pub mod delete;
pub mod start;
pub mod status;
pub mod stop;

mod prompt;
