pub mod monitor;
pub mod scheduler;
