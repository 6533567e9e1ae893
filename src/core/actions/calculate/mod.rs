pub mod driver;
pub mod errors;
pub mod handle;
pub mod ports;
