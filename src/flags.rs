//! Character mode-flag marshaling.
//!
//! The Fortran calling convention takes mode flags as character pointers and
//! only ever inspects the first character. BLAS flags are passed through
//! untranslated (the native routine reports bad modes through its own error
//! path); LAPACK flags go through [`validated`], which rejects anything
//! outside the routine's documented set before the native call happens.

use std::ffi::c_char;

use crate::error::{CallError, CallResult};

/// First character of a flag string, NUL if empty. An unmatched character is
/// reported by the native routine through its own error path.
pub(crate) fn first_char(flag: &str) -> c_char {
  flag.as_bytes().first().copied().unwrap_or(0) as c_char
}

/// Case-insensitive check of a flag's first character against `allowed`
/// (uppercase). Rejection skips the native call entirely.
pub(crate) fn validated(param: &'static str, value: &str, allowed: &[u8]) -> CallResult<c_char> {
  match value.as_bytes().first() {
    Some(&c) if allowed.contains(&c.to_ascii_uppercase()) => Ok(c as c_char),
    _ => Err(CallError::InvalidFlag { param, value: value.to_string() }),
  }
}

// ---------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_first_char() {
    assert_eq!(first_char("N"), b'N' as c_char);
    assert_eq!(first_char("Transpose"), b'T' as c_char);
    assert_eq!(first_char(""), 0);
  }

  #[test]
  fn test_validated_accepts_either_case() {
    assert_eq!(validated("uplo", "U", b"UL").unwrap(), b'U' as c_char);
    assert_eq!(validated("uplo", "l", b"UL").unwrap(), b'l' as c_char);
  }

  #[test]
  fn test_validated_rejects() {
    let err = validated("uplo", "X", b"UL").unwrap_err();
    assert_eq!(err, CallError::InvalidFlag { param: "uplo", value: "X".to_string() });
    assert!(validated("jobz", "", b"NV").is_err());
  }
}
