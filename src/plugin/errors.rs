use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginLoadError {
    #[error("cannot load formula library {}: {source}", .path.display())]
    Library {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("cannot load support library {}: {source}", .path.display())]
    SupportLibrary {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("formula library does not export `{symbol}`: {source}")]
    Symbol {
        symbol: &'static str,
        source: libloading::Error,
    },
    #[error("`pf_new` returned a null object")]
    NullObject,
    #[error("formula object has a null `{0}` entry")]
    NullVtable(&'static str),
}
