pub mod computation_plugin;
pub mod progress_sink;
