//! Shared-library bootstrap.
//!
//! Opens the configured backend library and binds every required symbol into
//! an immutable table of plain function pointers. Binding is all-or-nothing:
//! the first missing symbol aborts the whole load. Dropping a bound table
//! closes the library handle; close failures are not reported.

use std::ffi::OsStr;

use libloading::Library;

use crate::config;
use crate::error::LoadError;

pub(crate) fn open(module: &'static str, default_short: &'static str) -> Result<Library, LoadError> {
  let name = config::resolve_library_name(module, default_short);
  open_file(module, &name)
}

pub(crate) fn open_path(module: &'static str, path: &OsStr) -> Result<Library, LoadError> {
  open_file(module, path)
}

fn open_file(module: &'static str, name: impl AsRef<OsStr>) -> Result<Library, LoadError> {
  let name = name.as_ref();
  log::debug!("{}: opening native library {:?}", module, name);
  match unsafe { Library::new(name) } {
    Ok(lib) => Ok(lib),
    Err(e) => {
      log::error!("{}: failed to open native library {:?}: {}", module, name, e);
      Err(LoadError::OpenFailed {
        name: name.to_string_lossy().into_owned(),
        cause: e.to_string(),
      })
    },
  }
}

/// Declares a symbol-table struct and its all-or-nothing binder.
///
/// Each `field: sig = "name"` entry becomes a bound function pointer; each
/// name in the `probe` block is resolved (so a library missing it fails the
/// load) but not kept, because the corresponding wrapper is not written yet.
macro_rules! symbol_table {
  (
    $(#[$meta:meta])*
    pub struct $name:ident {
      $( $field:ident : $sig:ty = $sym:literal, )*
    }
    probe { $( $probe:literal, )* }
  ) => {
    $(#[$meta])*
    pub struct $name {
      _lib: ::libloading::Library,
      $( $field: $sig, )*
    }

    impl $name {
      pub(crate) fn bind(lib: ::libloading::Library) -> Result<Self, $crate::error::LoadError> {
        $(
          let $field: $sig = unsafe {
            *lib
              .get::<$sig>(concat!($sym, "\0").as_bytes())
              .map_err(|_| $crate::error::LoadError::MissingSymbol($sym))?
          };
        )*
        $(
          unsafe {
            lib
              .get::<unsafe extern "C" fn()>(concat!($probe, "\0").as_bytes())
              .map_err(|_| $crate::error::LoadError::MissingSymbol($probe))?;
          }
        )*
        Ok(Self { _lib: lib, $( $field, )* })
      }
    }
  };
}

/// Declares a wrapper that was never written: it fails with
/// `CallError::Unsupported` unconditionally and never touches any argument.
macro_rules! stub_routine {
  ($fn_name:ident ( $( $arg:ident : $ty:ty ),* $(,)? )) => {
    pub fn $fn_name(&self, $( $arg: $ty ),*) -> $crate::error::CallResult<()> {
      $( let _ = $arg; )*
      Err($crate::error::CallError::Unsupported(stringify!($fn_name)))
    }
  };
}

pub(crate) use stub_routine;
pub(crate) use symbol_table;

// ---------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_open_nonexistent_path() {
    let err = open_path("blas", OsStr::new("/nonexistent/libdoesnotexist.so")).unwrap_err();
    match err {
      LoadError::OpenFailed { name, .. } => {
        assert_eq!(name, "/nonexistent/libdoesnotexist.so");
      },
      other => panic!("expected OpenFailed, got {:?}", other),
    }
  }
}
