//! Backend library selection.
//!
//! Each module resolves its shared library from two overridable process
//! properties, read once when the module first loads:
//!
//! * `<MODULE>_NATIVE_LIB_PATH` -- an explicit library filename, used verbatim;
//! * `<MODULE>_NATIVE_LIB` -- a short name (default `blas` / `lapack` /
//!   `arpack`), expanded with the platform shared-library naming convention.

use std::env;

pub(crate) fn resolve_library_name(module: &str, default_short: &str) -> String {
  let module = module.to_ascii_uppercase();
  if let Some(path) = non_empty_var(&format!("{}_NATIVE_LIB_PATH", module)) {
    return path;
  }
  let short = non_empty_var(&format!("{}_NATIVE_LIB", module))
    .unwrap_or_else(|| default_short.to_string());
  platform_file_name(&short)
}

fn non_empty_var(name: &str) -> Option<String> {
  env::var(name).ok().filter(|v| !v.is_empty())
}

pub(crate) fn platform_file_name(short: &str) -> String {
  if cfg!(target_os = "windows") {
    format!("{}.dll", short)
  } else if cfg!(target_os = "macos") {
    format!("lib{}.dylib", short)
  } else {
    format!("lib{}.so", short)
  }
}

// ---------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_platform_file_name() {
    let name = platform_file_name("blas");
    if cfg!(target_os = "windows") {
      assert_eq!(name, "blas.dll");
    } else if cfg!(target_os = "macos") {
      assert_eq!(name, "libblas.dylib");
    } else {
      assert_eq!(name, "libblas.so");
    }
  }

  #[test]
  fn test_default_short_name() {
    // module names below are unique per test so that concurrently running
    // tests never observe each other's environment mutations
    assert_eq!(resolve_library_name("t0_blas", "blas"), platform_file_name("blas"));
  }

  #[test]
  fn test_short_name_override() {
    env::set_var("T1_BLAS_NATIVE_LIB", "openblas");
    assert_eq!(resolve_library_name("t1_blas", "blas"), platform_file_name("openblas"));
    env::remove_var("T1_BLAS_NATIVE_LIB");
  }

  #[test]
  fn test_explicit_path_wins() {
    env::set_var("T2_BLAS_NATIVE_LIB_PATH", "/opt/acme/libacmeblas.so.9");
    env::set_var("T2_BLAS_NATIVE_LIB", "openblas");
    assert_eq!(resolve_library_name("t2_blas", "blas"), "/opt/acme/libacmeblas.so.9");
    env::remove_var("T2_BLAS_NATIVE_LIB_PATH");
    env::remove_var("T2_BLAS_NATIVE_LIB");
  }

  #[test]
  fn test_empty_property_is_ignored() {
    env::set_var("T3_BLAS_NATIVE_LIB_PATH", "");
    assert_eq!(resolve_library_name("t3_blas", "blas"), platform_file_name("blas"));
    env::remove_var("T3_BLAS_NATIVE_LIB_PATH");
  }
}
