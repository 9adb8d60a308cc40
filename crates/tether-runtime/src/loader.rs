//! Native library loading
//!
//! `NativeLibrary` is the one boundary behind which platform loading lives.
//! `LibraryLoader` opens a platform-neutral base path by trying each naming
//! convention in order (`<base>.so`, then `<base>.dll`) and keeps the cause of
//! every failed attempt.

use crate::handle::LibraryHandle;
use libloading::Library;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source of native symbols
pub trait NativeLibrary {
    /// Human-readable name used in errors and logs
    fn describe(&self) -> &str;

    /// Address of an exported function, if present
    fn resolve(&self, symbol: &str) -> Option<*const ()>;
}

/// A shared library opened through the OS loader
///
/// The library is never unloaded. Dropping a `DynamicLibrary` releases the
/// Rust value only, so resolved function pointers and any text or pointer
/// borrowed from library memory stay valid for the life of the process.
pub struct DynamicLibrary {
    path: PathBuf,
    label: String,
    library: ManuallyDrop<Library>,
}

impl DynamicLibrary {
    /// Open the library at exactly `path`
    ///
    /// # Safety
    ///
    /// Loading a dynamic library runs its initialization code in this process.
    /// The caller must trust the library.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, libloading::Error> {
        let path = path.as_ref();
        let library = unsafe { Library::new(path)? };
        Ok(Self {
            path: path.to_path_buf(),
            label: path.display().to_string(),
            library: ManuallyDrop::new(library),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NativeLibrary for DynamicLibrary {
    fn describe(&self) -> &str {
        &self.label
    }

    fn resolve(&self, symbol: &str) -> Option<*const ()> {
        // SAFETY: only the address is taken; callers cast it to the declared signature
        let function = unsafe { self.library.get::<unsafe extern "C" fn()>(symbol.as_bytes()) };
        function.ok().map(|function| *function as *const ())
    }
}

impl fmt::Debug for DynamicLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// In-process table of exported functions
///
/// Stands in for a shared library when the native code is linked into the
/// host, or when tests provide Rust `extern "C"` implementations.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    label: String,
    symbols: HashMap<String, *const ()>,
}

impl SymbolTable {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            symbols: HashMap::new(),
        }
    }

    /// Add a symbol, builder style
    pub fn with(mut self, symbol: impl Into<String>, address: *const ()) -> Self {
        self.insert(symbol, address);
        self
    }

    /// Add or replace a symbol, returning the previous address
    pub fn insert(&mut self, symbol: impl Into<String>, address: *const ()) -> Option<*const ()> {
        self.symbols.insert(symbol.into(), address)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl NativeLibrary for SymbolTable {
    fn describe(&self) -> &str {
        &self.label
    }

    fn resolve(&self, symbol: &str) -> Option<*const ()> {
        self.symbols.get(symbol).copied()
    }
}

/// Native artifact naming conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingConvention {
    /// Unix shared object, `<base>.so`
    SharedObject,
    /// Windows dynamic library, `<base>.dll`
    DynamicLibrary,
}

impl NamingConvention {
    pub fn extension(&self) -> &'static str {
        match self {
            NamingConvention::SharedObject => "so",
            NamingConvention::DynamicLibrary => "dll",
        }
    }

    /// Append this convention's extension to `base`
    ///
    /// The base is never treated as having an extension of its own, so
    /// `libfoo.v2` becomes `libfoo.v2.so`.
    pub fn path_for(&self, base: &Path) -> PathBuf {
        let mut path = OsString::from(base.as_os_str());
        path.push(".");
        path.push(self.extension());
        PathBuf::from(path)
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingConvention::SharedObject => f.write_str("shared object (.so)"),
            NamingConvention::DynamicLibrary => f.write_str("dynamic library (.dll)"),
        }
    }
}

/// One failed attempt to open a candidate path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAttempt {
    pub convention: NamingConvention,
    pub path: PathBuf,
    pub cause: String,
}

impl fmt::Display for LoadAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.cause)
    }
}

/// Every naming convention failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load native library '{}' ({})", .base.display(), summarize(.attempts))]
pub struct LoadError {
    pub base: PathBuf,
    pub attempts: Vec<LoadAttempt>,
}

fn summarize(attempts: &[LoadAttempt]) -> String {
    if attempts.is_empty() {
        return "no naming conventions configured".to_string();
    }
    let causes: Vec<String> = attempts.iter().map(ToString::to_string).collect();
    causes.join("; ")
}

/// Opens native artifacts from a platform-neutral base path
#[derive(Debug, Clone)]
pub struct LibraryLoader {
    conventions: Vec<NamingConvention>,
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self {
            conventions: vec![
                NamingConvention::SharedObject,
                NamingConvention::DynamicLibrary,
            ],
        }
    }
}

impl LibraryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom convention order
    pub fn with_conventions(conventions: Vec<NamingConvention>) -> Self {
        Self { conventions }
    }

    pub fn conventions(&self) -> &[NamingConvention] {
        &self.conventions
    }

    /// Paths tried for `base`, in order
    pub fn candidates(&self, base: &Path) -> Vec<PathBuf> {
        self.conventions
            .iter()
            .map(|convention| convention.path_for(base))
            .collect()
    }

    /// Open the first candidate that loads
    ///
    /// Convention selection happens here, at load time, on every platform.
    pub fn open(&self, base: impl AsRef<Path>) -> Result<LibraryHandle, LoadError> {
        let base = base.as_ref();
        let mut attempts = Vec::with_capacity(self.conventions.len());

        for convention in &self.conventions {
            let path = convention.path_for(base);
            tracing::debug!(path = %path.display(), %convention, "opening native library");
            match DynamicLibrary::open(&path) {
                Ok(library) => {
                    tracing::info!(path = %path.display(), "loaded native library");
                    return Ok(LibraryHandle::new(library));
                }
                Err(error) => {
                    tracing::debug!(path = %path.display(), %error, "native library did not load");
                    attempts.push(LoadAttempt {
                        convention: *convention,
                        path,
                        cause: error.to_string(),
                    });
                }
            }
        }

        Err(LoadError {
            base: base.to_path_buf(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_appends_extension() {
        let base = Path::new("build/libmath.v2");
        assert_eq!(
            NamingConvention::SharedObject.path_for(base),
            PathBuf::from("build/libmath.v2.so")
        );
        assert_eq!(
            NamingConvention::DynamicLibrary.path_for(base),
            PathBuf::from("build/libmath.v2.dll")
        );
    }

    #[test]
    fn test_default_order_is_so_then_dll() {
        let loader = LibraryLoader::new();
        assert_eq!(
            loader.conventions(),
            &[
                NamingConvention::SharedObject,
                NamingConvention::DynamicLibrary
            ]
        );
        assert_eq!(
            loader.candidates(Path::new("lib")),
            vec![PathBuf::from("lib.so"), PathBuf::from("lib.dll")]
        );
    }

    #[test]
    fn test_symbol_table_resolves_exact_names() {
        extern "C" fn noop() {}
        let table = SymbolTable::new("in-process").with("noop", noop as *const ());
        assert_eq!(table.resolve("noop"), Some(noop as *const ()));
        assert_eq!(table.resolve("Noop"), None);
        assert_eq!(table.describe(), "in-process");
    }

    #[test]
    fn test_load_error_display_lists_attempts() {
        let error = LoadError {
            base: PathBuf::from("missing"),
            attempts: vec![
                LoadAttempt {
                    convention: NamingConvention::SharedObject,
                    path: PathBuf::from("missing.so"),
                    cause: "not found".to_string(),
                },
                LoadAttempt {
                    convention: NamingConvention::DynamicLibrary,
                    path: PathBuf::from("missing.dll"),
                    cause: "not found".to_string(),
                },
            ],
        };
        assert_eq!(
            error.to_string(),
            "failed to load native library 'missing' (missing.so: not found; missing.dll: not found)"
        );
    }
}
