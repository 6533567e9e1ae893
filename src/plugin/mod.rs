//! Formula libraries loaded at runtime.

pub mod abi;
pub mod errors;
pub mod loader;
pub mod native;

pub use errors::PluginLoadError;
pub use loader::PluginLoader;
pub use native::NativePlugin;
