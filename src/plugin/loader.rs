use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::{debug, info};

use crate::core::actions::calculate::handle::ComputationHandle;
use crate::core::actions::calculate::ports::computation_plugin::Concurrency;
use crate::core::data::formula_param::ParameterSpec;
use crate::plugin::abi::{PF_CONCURRENCY_SYMBOL, PF_NEW_SYMBOL, PfConcurrencyFn, PfNewFn};
use crate::plugin::errors::PluginLoadError;
use crate::plugin::native::NativePlugin;

#[cfg(unix)]
fn open_global(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    // SAFETY: loading runs the library's initializers; the path is chosen by
    // the caller, who vouches for the library.
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_global(path: &Path) -> Result<Library, libloading::Error> {
    // SAFETY: as above.
    unsafe { Library::new(path) }
}

#[cfg(unix)]
fn open_local(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_NOW};

    // SAFETY: as for `open_global`.
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_local(path: &Path) -> Result<Library, libloading::Error> {
    // SAFETY: as for `open_global`.
    unsafe { Library::new(path) }
}

/// Binds formula libraries exporting `pf_new`.
///
/// When a support library is configured it is opened first with its symbols
/// made visible to everything loaded afterwards, and stays loaded for as
/// long as any plugin created by this loader.
#[derive(Debug, Default)]
pub struct PluginLoader {
    support_path: Option<PathBuf>,
    support: Option<Arc<Library>>,
}

impl PluginLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_support_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.support_path = Some(path.into());
        self
    }

    fn support_library(&mut self) -> Result<Option<Arc<Library>>, PluginLoadError> {
        let Some(path) = &self.support_path else {
            return Ok(None);
        };

        if self.support.is_none() {
            let library = open_global(path).map_err(|source| PluginLoadError::SupportLibrary {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "support library loaded");
            self.support = Some(Arc::new(library));
        }

        Ok(self.support.clone())
    }

    /// Loads `formula` and instantiates its point function.
    ///
    /// `spec` declares the parameters the formula's `init` expects; the
    /// library itself carries no such description.
    pub fn load(
        &mut self,
        formula: impl AsRef<Path>,
        spec: ParameterSpec,
    ) -> Result<ComputationHandle, PluginLoadError> {
        let formula = formula.as_ref();
        let support = self.support_library()?;

        let library = open_local(formula).map_err(|source| PluginLoadError::Library {
            path: formula.to_path_buf(),
            source,
        })?;

        // SAFETY: `pf_new` has the documented factory signature.
        let factory: PfNewFn = unsafe { library.get::<PfNewFn>(PF_NEW_SYMBOL) }
            .map(|symbol| *symbol)
            .map_err(|source| PluginLoadError::Symbol {
                symbol: "pf_new",
                source,
            })?;

        // SAFETY: `pf_concurrency` takes no arguments and returns an int.
        let concurrency = match unsafe { library.get::<PfConcurrencyFn>(PF_CONCURRENCY_SYMBOL) } {
            // SAFETY: as above.
            Ok(symbol) if unsafe { symbol() } != 0 => Concurrency::Serialized,
            _ => Concurrency::Shared,
        };

        let name = formula
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| formula.display().to_string());

        let plugin = NativePlugin::new(name, spec, concurrency, factory, library, support)?;

        info!(path = %formula.display(), ?concurrency, "formula loaded");
        Ok(ComputationHandle::new(Box::new(plugin)))
    }
}
