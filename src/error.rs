use std::fmt;

// ---------------------------------------------------------------------- //

/// Failure to open the backend shared library or to bind one of its symbols.
///
/// Binding is all-or-nothing: a single missing symbol fails the whole load
/// and no routine of that module becomes callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
  OpenFailed { name: String, cause: String },
  MissingSymbol(&'static str),
}

pub type LoadResult<T> = Result<T, LoadError>;

impl fmt::Display for LoadError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LoadError::OpenFailed { name, cause } => {
        write!(f, "failed to open native library {}: {}", name, cause)
      },
      LoadError::MissingSymbol(sym) => {
        write!(f, "symbol {} is not available in the native library", sym)
      },
    }
  }
}

impl std::error::Error for LoadError {}

// ---------------------------------------------------------------------- //

/// Recoverable failure of a single wrapper call. The native routine is never
/// invoked when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
  /// The routine is declared but its wrapper was never written.
  Unsupported(&'static str),
  /// A character mode flag did not match the set the routine accepts.
  InvalidFlag { param: &'static str, value: String },
  /// An internal scratch allocation failed.
  OutOfMemory,
}

pub type CallResult<T> = Result<T, CallError>;

impl fmt::Display for CallError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CallError::Unsupported(routine) => {
        write!(f, "routine {} is not implemented", routine)
      },
      CallError::InvalidFlag { param, value } => {
        write!(f, "invalid value {:?} for mode flag {}", value, param)
      },
      CallError::OutOfMemory => {
        write!(f, "failed to allocate native scratch memory")
      },
    }
  }
}

impl std::error::Error for CallError {}

// ---------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    let e = LoadError::OpenFailed { name: "libblas.so".to_string(), cause: "no such file".to_string() };
    assert_eq!(e.to_string(), "failed to open native library libblas.so: no such file");
    let e = LoadError::MissingSymbol("daxpy_");
    assert_eq!(e.to_string(), "symbol daxpy_ is not available in the native library");
    let e = CallError::Unsupported("dtrmv");
    assert_eq!(e.to_string(), "routine dtrmv is not implemented");
    let e = CallError::InvalidFlag { param: "uplo", value: "X".to_string() };
    assert_eq!(e.to_string(), "invalid value \"X\" for mode flag uplo");
  }
}
