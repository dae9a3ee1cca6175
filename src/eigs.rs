//! Symmetric sparse eigensolver on top of the runtime-bound ARPACK table.
//!
//! Drives the reverse-communication loop: the caller supplies the
//! matrix-vector product as a closure and never sees `ido`, work arrays or
//! `ipntr` bookkeeping.

use std::ffi::c_int;
use std::fmt::{self, Debug, Display};

use crate::arpack::DynArpack;
use crate::error::CallError;

// ---------------------------------------------------------------------- //

/// Part of the spectrum to compute (symmetric problems).
#[derive(Debug, Clone, Copy)]
pub enum Which {
  LargestMagnitude,
  SmallestMagnitude,
  LargestAlgebraic,
  SmallestAlgebraic,
  BothEnds,
}

impl Which {
  fn code(self) -> &'static str {
    match self {
      Self::LargestMagnitude  => "LM",
      Self::SmallestMagnitude => "SM",
      Self::LargestAlgebraic  => "LA",
      Self::SmallestAlgebraic => "SA",
      Self::BothEnds          => "BE",
    }
  }
}

// ---------------------------------------------------------------------- //

#[derive(Clone, PartialEq, Eq)]
pub enum EigsError {
  WrongParameters(&'static str),
  ErrorWithCode(c_int),
  Call(CallError),
}

impl From<CallError> for EigsError {
  fn from(e: CallError) -> Self {
    Self::Call(e)
  }
}

impl Display for EigsError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::WrongParameters(s) => write!(f, "incorrect input parameters: {}", s),
      Self::ErrorWithCode(c) => write!(f, "error with code {}, see ARPACK documentation", c),
      Self::Call(e) => write!(f, "{}", e),
    }
  }
}

impl Debug for EigsError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    Display::fmt(self, f)
  }
}

impl std::error::Error for EigsError {}

// ---------------------------------------------------------------------- //

macro_rules! impl_symmetric_eigs {
  ($fn_name:ident, $saupd:ident, $seupd:ident, $t:ty) => {
    /// Computes `nev` eigenpairs of a symmetric operator of dimension `n`.
    ///
    /// `op` receives the source vector and the destination slice for the
    /// product. Returns the eigenvalues (ascending within the selected set)
    /// and the eigenvectors column by column.
    pub fn $fn_name(
      arpack: &DynArpack,
      op: &mut impl FnMut(&[$t], &mut [$t]),
      n: usize,
      nev: usize,
      which: Which,
      tol: $t,
      maxiter: usize,
    ) -> Result<(Vec<$t>, Vec<$t>), EigsError> {
      if nev == 0 || nev + 1 > n {
        return Err(EigsError::WrongParameters("the following condition must hold true: 0 < nev < n"));
      }
      let mut ido: c_int = 0;
      let bmat = "I";
      let ncv = std::cmp::min(std::cmp::max(2 * nev + 1, 20), n);
      let mut resid: Vec<$t> = vec![0.0; n];
      let mut v: Vec<$t> = vec![0.0; n * ncv];
      let mut iparam = [0 as c_int; 11];
      iparam[0] = 1;
      iparam[2] = maxiter as c_int;
      iparam[6] = 1;
      let mut ipntr = [0 as c_int; 11];
      let mut workd: Vec<$t> = vec![0.0; 3 * n];
      let lworkl = ncv * (ncv + 8);
      let mut workl: Vec<$t> = vec![0.0; lworkl];
      let mut info: c_int = 0;
      while ido != 99 {
        unsafe {
          arpack.$saupd(
            &mut ido, bmat, n as c_int, which.code(), nev as c_int, tol,
            &mut resid, 0, ncv as c_int, &mut v, 0, n as c_int,
            &mut iparam, 0, &mut ipntr, 0, &mut workd, 0, &mut workl, 0,
            lworkl as c_int, &mut info,
          );
        }
        if (ido == 1) || (ido == -1) {
          let src = workd[(ipntr[0] as usize - 1)..(ipntr[0] as usize + n - 1)].to_owned();
          let dst = &mut workd[(ipntr[1] as usize - 1)..(ipntr[1] as usize + n - 1)];
          op(&src, dst);
        }
      }
      match info {
        0 | 1 | 2 => {},
        -1 => return Err(EigsError::WrongParameters("n must be positive")),
        -2 => return Err(EigsError::WrongParameters("nev must be positive")),
        -3 => return Err(EigsError::WrongParameters("the following condition must hold true: ncv - nev >= 1 && ncv <= n")),
        -4 => return Err(EigsError::WrongParameters("maxiter must be greater than 0")),
        i => return Err(EigsError::ErrorWithCode(i)),
      }
      let mut select = vec![false; ncv];
      let mut d: Vec<$t> = vec![0.0; nev];
      let mut z: Vec<$t> = vec![0.0; n * nev];
      let mut nev_out = nev as c_int;
      let sigma: $t = 0.0;
      unsafe {
        arpack.$seupd(
          true, "A", &mut select, 0, &mut d, 0, &mut z, 0, n as c_int, sigma,
          bmat, n as c_int, which.code(), &mut nev_out, tol,
          &mut resid, 0, ncv as c_int, &mut v, 0, n as c_int,
          &mut iparam, 0, &mut ipntr, 0, &mut workd, 0, &mut workl, 0,
          lworkl as c_int, &mut info,
        )?;
      }
      if info != 0 {
        return Err(EigsError::ErrorWithCode(info));
      }
      Ok((d, z))
    }
  };
}

impl_symmetric_eigs!(symmetric_eigs_f64, dsaupd, dseupd, f64);
impl_symmetric_eigs!(symmetric_eigs_f32, ssaupd, sseupd, f32);

// ---------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arpack::tests::lib;

  #[test]
  fn test_symmetric_eigs_diagonal() {
    let Some(arpack) = lib() else { return };
    let n = 50;
    let nev = 3;
    let mut op = |src: &[f64], dst: &mut [f64]| {
      for i in 0..n {
        dst[i] = (i + 1) as f64 * src[i];
      }
    };
    let (d, z) =
      symmetric_eigs_f64(arpack, &mut op, n, nev, Which::LargestAlgebraic, 1e-10, 10000).unwrap();
    assert_eq!(d.len(), nev);
    assert_eq!(z.len(), n * nev);
    let mut got = d.clone();
    got.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for (g, want) in got.iter().zip([48.0, 49.0, 50.0]) {
      assert!((g - want).abs() < 1e-6, "eigenvalue {} != {}", g, want);
    }
    // residual check column by column
    for (j, lambda) in d.iter().enumerate() {
      let col = &z[j * n..(j + 1) * n];
      let mut resid = 0f64;
      for i in 0..n {
        resid += ((i + 1) as f64 * col[i] - lambda * col[i]).powi(2);
      }
      assert!(resid.sqrt() < 1e-6);
    }
  }

  #[test]
  fn test_symmetric_eigs_dense() {
    let Some(arpack) = lib() else { return };
    let n = 30;
    let nev = 2;
    // A = B + B^T for a deterministic B, symmetric by construction
    let mut a = vec![0f64; n * n];
    for j in 0..n {
      for i in 0..n {
        let b_ij = ((i * 31 + j * 17) % 13) as f64 / 13.0;
        let b_ji = ((j * 31 + i * 17) % 13) as f64 / 13.0;
        a[j * n + i] = b_ij + b_ji;
      }
    }
    let a_op = a.clone();
    let mut op = |src: &[f64], dst: &mut [f64]| {
      for i in 0..n {
        let mut acc = 0f64;
        for j in 0..n {
          acc += a_op[j * n + i] * src[j];
        }
        dst[i] = acc;
      }
    };
    let (d, z) =
      symmetric_eigs_f64(arpack, &mut op, n, nev, Which::LargestMagnitude, 1e-10, 10000).unwrap();
    for (j, lambda) in d.iter().enumerate() {
      let col = &z[j * n..(j + 1) * n];
      let mut resid = 0f64;
      let mut norm = 0f64;
      for i in 0..n {
        let mut acc = 0.0;
        for k in 0..n {
          acc += a[k * n + i] * col[k];
        }
        resid += (acc - lambda * col[i]).powi(2);
        norm += col[i].powi(2);
      }
      assert!((norm - 1.0).abs() < 1e-8);
      assert!(resid.sqrt() < 1e-6);
    }
  }

  #[test]
  fn test_rejects_bad_nev() {
    let Some(arpack) = lib() else { return };
    let mut op = |_: &[f64], _: &mut [f64]| {};
    let err = symmetric_eigs_f64(arpack, &mut op, 10, 0, Which::LargestAlgebraic, 1e-10, 100)
      .unwrap_err();
    assert!(matches!(err, EigsError::WrongParameters(_)));
    let err = symmetric_eigs_f64(arpack, &mut op, 4, 4, Which::LargestAlgebraic, 1e-10, 100)
      .unwrap_err();
    assert!(matches!(err, EigsError::WrongParameters(_)));
  }
}
