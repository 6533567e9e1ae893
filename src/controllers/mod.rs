pub mod cli;
pub mod job;
pub mod ports;
