//! Runtime-bound LAPACK (double and single precision real).
//!
//! Same marshaling contract as the BLAS module, with two additions: every
//! routine carries an `info: &mut c_int` status output written after the
//! native call returns, and character mode flags are validated against the
//! routine's documented set before anything native runs (a bad flag skips the
//! call and comes back as `CallError::InvalidFlag`). Work arrays and `lwork`
//! stay caller-supplied, so the usual `lwork = -1` workspace query goes
//! straight through.

use std::ffi::{
  c_char,
  c_int,
  OsStr,
};

use once_cell::sync::OnceCell;

use crate::error::{CallResult, LoadError};
use crate::flags;
use crate::loader;
use crate::loader::symbol_table;

// ---------------------------------------------------------------------- //

symbol_table! {
  /// Symbol table of a loaded LAPACK library.
  pub struct DynLapack {
    dgesv_:  unsafe extern "C" fn(*const c_int, *const c_int, *mut f64, *const c_int, *mut c_int, *mut f64, *const c_int, *mut c_int) = "dgesv_",
    sgesv_:  unsafe extern "C" fn(*const c_int, *const c_int, *mut f32, *const c_int, *mut c_int, *mut f32, *const c_int, *mut c_int) = "sgesv_",
    dgetrf_: unsafe extern "C" fn(*const c_int, *const c_int, *mut f64, *const c_int, *mut c_int, *mut c_int) = "dgetrf_",
    sgetrf_: unsafe extern "C" fn(*const c_int, *const c_int, *mut f32, *const c_int, *mut c_int, *mut c_int) = "sgetrf_",
    dgetrs_: unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f64, *const c_int, *const c_int, *mut f64, *const c_int, *mut c_int) = "dgetrs_",
    sgetrs_: unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f32, *const c_int, *const c_int, *mut f32, *const c_int, *mut c_int) = "sgetrs_",
    dgetri_: unsafe extern "C" fn(*const c_int, *mut f64, *const c_int, *const c_int, *mut f64, *const c_int, *mut c_int) = "dgetri_",
    sgetri_: unsafe extern "C" fn(*const c_int, *mut f32, *const c_int, *const c_int, *mut f32, *const c_int, *mut c_int) = "sgetri_",
    dpotrf_: unsafe extern "C" fn(*const c_char, *const c_int, *mut f64, *const c_int, *mut c_int) = "dpotrf_",
    spotrf_: unsafe extern "C" fn(*const c_char, *const c_int, *mut f32, *const c_int, *mut c_int) = "spotrf_",
    dpotrs_: unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f64, *const c_int, *mut f64, *const c_int, *mut c_int) = "dpotrs_",
    spotrs_: unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f32, *const c_int, *mut f32, *const c_int, *mut c_int) = "spotrs_",
    dposv_:  unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *mut f64, *const c_int, *mut f64, *const c_int, *mut c_int) = "dposv_",
    sposv_:  unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *mut f32, *const c_int, *mut f32, *const c_int, *mut c_int) = "sposv_",
    dgeqrf_: unsafe extern "C" fn(*const c_int, *const c_int, *mut f64, *const c_int, *mut f64, *mut f64, *const c_int, *mut c_int) = "dgeqrf_",
    sgeqrf_: unsafe extern "C" fn(*const c_int, *const c_int, *mut f32, *const c_int, *mut f32, *mut f32, *const c_int, *mut c_int) = "sgeqrf_",
    dorgqr_: unsafe extern "C" fn(*const c_int, *const c_int, *const c_int, *mut f64, *const c_int, *const f64, *mut f64, *const c_int, *mut c_int) = "dorgqr_",
    sorgqr_: unsafe extern "C" fn(*const c_int, *const c_int, *const c_int, *mut f32, *const c_int, *const f32, *mut f32, *const c_int, *mut c_int) = "sorgqr_",
    dgesvd_: unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *mut f64, *const c_int, *mut f64, *mut f64, *const c_int, *mut f64, *const c_int, *mut f64, *const c_int, *mut c_int) = "dgesvd_",
    sgesvd_: unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *mut f32, *const c_int, *mut f32, *mut f32, *const c_int, *mut f32, *const c_int, *mut f32, *const c_int, *mut c_int) = "sgesvd_",
    dsyev_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *mut f64, *const c_int, *mut f64, *mut f64, *const c_int, *mut c_int) = "dsyev_",
    ssyev_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *mut f32, *const c_int, *mut f32, *mut f32, *const c_int, *mut c_int) = "ssyev_",
    dgeev_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *mut f64, *const c_int, *mut f64, *mut f64, *mut f64, *const c_int, *mut f64, *const c_int, *mut f64, *const c_int, *mut c_int) = "dgeev_",
    sgeev_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *mut f32, *const c_int, *mut f32, *mut f32, *mut f32, *const c_int, *mut f32, *const c_int, *mut f32, *const c_int, *mut c_int) = "sgeev_",
    dgels_:  unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const c_int, *mut f64, *const c_int, *mut f64, *const c_int, *mut f64, *const c_int, *mut c_int) = "dgels_",
    sgels_:  unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const c_int, *mut f32, *const c_int, *mut f32, *const c_int, *mut f32, *const c_int, *mut c_int) = "sgels_",
    dlacpy_: unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f64, *const c_int, *mut f64, *const c_int) = "dlacpy_",
    slacpy_: unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f32, *const c_int, *mut f32, *const c_int) = "slacpy_",
    dlaswp_: unsafe extern "C" fn(*const c_int, *mut f64, *const c_int, *const c_int, *const c_int, *const c_int, *const c_int) = "dlaswp_",
    slaswp_: unsafe extern "C" fn(*const c_int, *mut f32, *const c_int, *const c_int, *const c_int, *const c_int, *const c_int) = "slaswp_",
    dlange_: unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f64, *const c_int, *mut f64) -> f64 = "dlange_",
    slange_: unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f32, *const c_int, *mut f32) -> f32 = "slange_",
    dlamch_: unsafe extern "C" fn(*const c_char) -> f64 = "dlamch_",
    slamch_: unsafe extern "C" fn(*const c_char) -> f32 = "slamch_",
  }
  probe {}
}

impl DynLapack {
  /// Opens the library named by the `LAPACK_NATIVE_LIB_PATH` /
  /// `LAPACK_NATIVE_LIB` process properties (default short name `lapack`).
  pub fn load() -> Result<Self, LoadError> {
    Self::bind(loader::open("lapack", "lapack")?)
  }

  pub fn load_from(path: impl AsRef<OsStr>) -> Result<Self, LoadError> {
    Self::bind(loader::open_path("lapack", path.as_ref())?)
  }
}

// ---------------------------------------------------------------------- //

macro_rules! impl_gesv {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, nrhs: c_int, a: &mut [$t], offseta: usize, lda: c_int, ipiv: &mut [c_int], offsetipiv: usize, b: &mut [$t], offsetb: usize, ldb: c_int, info: &mut c_int) {
      (self.$sym)(&n, &nrhs, a.as_mut_ptr().add(offseta), &lda, ipiv.as_mut_ptr().add(offsetipiv), b.as_mut_ptr().add(offsetb), &ldb, info)
    }
  };
}

macro_rules! impl_getrf {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, m: c_int, n: c_int, a: &mut [$t], offseta: usize, lda: c_int, ipiv: &mut [c_int], offsetipiv: usize, info: &mut c_int) {
      (self.$sym)(&m, &n, a.as_mut_ptr().add(offseta), &lda, ipiv.as_mut_ptr().add(offsetipiv), info)
    }
  };
}

macro_rules! impl_getrs {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, trans: &str, n: c_int, nrhs: c_int, a: &[$t], offseta: usize, lda: c_int, ipiv: &[c_int], offsetipiv: usize, b: &mut [$t], offsetb: usize, ldb: c_int, info: &mut c_int) -> CallResult<()> {
      let trans = flags::validated("trans", trans, b"NTC")?;
      (self.$sym)(&trans, &n, &nrhs, a.as_ptr().add(offseta), &lda, ipiv.as_ptr().add(offsetipiv), b.as_mut_ptr().add(offsetb), &ldb, info);
      Ok(())
    }
  };
}

macro_rules! impl_getri {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, a: &mut [$t], offseta: usize, lda: c_int, ipiv: &[c_int], offsetipiv: usize, work: &mut [$t], offsetwork: usize, lwork: c_int, info: &mut c_int) {
      (self.$sym)(&n, a.as_mut_ptr().add(offseta), &lda, ipiv.as_ptr().add(offsetipiv), work.as_mut_ptr().add(offsetwork), &lwork, info)
    }
  };
}

macro_rules! impl_potrf {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, n: c_int, a: &mut [$t], offseta: usize, lda: c_int, info: &mut c_int) -> CallResult<()> {
      let uplo = flags::validated("uplo", uplo, b"UL")?;
      (self.$sym)(&uplo, &n, a.as_mut_ptr().add(offseta), &lda, info);
      Ok(())
    }
  };
}

macro_rules! impl_potrs {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, n: c_int, nrhs: c_int, a: &[$t], offseta: usize, lda: c_int, b: &mut [$t], offsetb: usize, ldb: c_int, info: &mut c_int) -> CallResult<()> {
      let uplo = flags::validated("uplo", uplo, b"UL")?;
      (self.$sym)(&uplo, &n, &nrhs, a.as_ptr().add(offseta), &lda, b.as_mut_ptr().add(offsetb), &ldb, info);
      Ok(())
    }
  };
}

macro_rules! impl_posv {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, n: c_int, nrhs: c_int, a: &mut [$t], offseta: usize, lda: c_int, b: &mut [$t], offsetb: usize, ldb: c_int, info: &mut c_int) -> CallResult<()> {
      let uplo = flags::validated("uplo", uplo, b"UL")?;
      (self.$sym)(&uplo, &n, &nrhs, a.as_mut_ptr().add(offseta), &lda, b.as_mut_ptr().add(offsetb), &ldb, info);
      Ok(())
    }
  };
}

macro_rules! impl_geqrf {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, m: c_int, n: c_int, a: &mut [$t], offseta: usize, lda: c_int, tau: &mut [$t], offsettau: usize, work: &mut [$t], offsetwork: usize, lwork: c_int, info: &mut c_int) {
      (self.$sym)(&m, &n, a.as_mut_ptr().add(offseta), &lda, tau.as_mut_ptr().add(offsettau), work.as_mut_ptr().add(offsetwork), &lwork, info)
    }
  };
}

macro_rules! impl_orgqr {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, m: c_int, n: c_int, k: c_int, a: &mut [$t], offseta: usize, lda: c_int, tau: &[$t], offsettau: usize, work: &mut [$t], offsetwork: usize, lwork: c_int, info: &mut c_int) {
      (self.$sym)(&m, &n, &k, a.as_mut_ptr().add(offseta), &lda, tau.as_ptr().add(offsettau), work.as_mut_ptr().add(offsetwork), &lwork, info)
    }
  };
}

macro_rules! impl_gesvd {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, jobu: &str, jobvt: &str, m: c_int, n: c_int, a: &mut [$t], offseta: usize, lda: c_int, s: &mut [$t], offsets: usize, u: &mut [$t], offsetu: usize, ldu: c_int, vt: &mut [$t], offsetvt: usize, ldvt: c_int, work: &mut [$t], offsetwork: usize, lwork: c_int, info: &mut c_int) -> CallResult<()> {
      let jobu = flags::validated("jobu", jobu, b"ASON")?;
      let jobvt = flags::validated("jobvt", jobvt, b"ASON")?;
      (self.$sym)(&jobu, &jobvt, &m, &n, a.as_mut_ptr().add(offseta), &lda, s.as_mut_ptr().add(offsets), u.as_mut_ptr().add(offsetu), &ldu, vt.as_mut_ptr().add(offsetvt), &ldvt, work.as_mut_ptr().add(offsetwork), &lwork, info);
      Ok(())
    }
  };
}

macro_rules! impl_syev {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, jobz: &str, uplo: &str, n: c_int, a: &mut [$t], offseta: usize, lda: c_int, w: &mut [$t], offsetw: usize, work: &mut [$t], offsetwork: usize, lwork: c_int, info: &mut c_int) -> CallResult<()> {
      let jobz = flags::validated("jobz", jobz, b"NV")?;
      let uplo = flags::validated("uplo", uplo, b"UL")?;
      (self.$sym)(&jobz, &uplo, &n, a.as_mut_ptr().add(offseta), &lda, w.as_mut_ptr().add(offsetw), work.as_mut_ptr().add(offsetwork), &lwork, info);
      Ok(())
    }
  };
}

macro_rules! impl_geev {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, jobvl: &str, jobvr: &str, n: c_int, a: &mut [$t], offseta: usize, lda: c_int, wr: &mut [$t], offsetwr: usize, wi: &mut [$t], offsetwi: usize, vl: &mut [$t], offsetvl: usize, ldvl: c_int, vr: &mut [$t], offsetvr: usize, ldvr: c_int, work: &mut [$t], offsetwork: usize, lwork: c_int, info: &mut c_int) -> CallResult<()> {
      let jobvl = flags::validated("jobvl", jobvl, b"NV")?;
      let jobvr = flags::validated("jobvr", jobvr, b"NV")?;
      (self.$sym)(&jobvl, &jobvr, &n, a.as_mut_ptr().add(offseta), &lda, wr.as_mut_ptr().add(offsetwr), wi.as_mut_ptr().add(offsetwi), vl.as_mut_ptr().add(offsetvl), &ldvl, vr.as_mut_ptr().add(offsetvr), &ldvr, work.as_mut_ptr().add(offsetwork), &lwork, info);
      Ok(())
    }
  };
}

macro_rules! impl_gels {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, trans: &str, m: c_int, n: c_int, nrhs: c_int, a: &mut [$t], offseta: usize, lda: c_int, b: &mut [$t], offsetb: usize, ldb: c_int, work: &mut [$t], offsetwork: usize, lwork: c_int, info: &mut c_int) -> CallResult<()> {
      let trans = flags::validated("trans", trans, b"NT")?;
      (self.$sym)(&trans, &m, &n, &nrhs, a.as_mut_ptr().add(offseta), &lda, b.as_mut_ptr().add(offsetb), &ldb, work.as_mut_ptr().add(offsetwork), &lwork, info);
      Ok(())
    }
  };
}

macro_rules! impl_lacpy {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, m: c_int, n: c_int, a: &[$t], offseta: usize, lda: c_int, b: &mut [$t], offsetb: usize, ldb: c_int) -> CallResult<()> {
      // 'A' copies the full rectangle
      let uplo = flags::validated("uplo", uplo, b"ULA")?;
      (self.$sym)(&uplo, &m, &n, a.as_ptr().add(offseta), &lda, b.as_mut_ptr().add(offsetb), &ldb);
      Ok(())
    }
  };
}

macro_rules! impl_laswp {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, a: &mut [$t], offseta: usize, lda: c_int, k1: c_int, k2: c_int, ipiv: &[c_int], offsetipiv: usize, incx: c_int) {
      (self.$sym)(&n, a.as_mut_ptr().add(offseta), &lda, &k1, &k2, ipiv.as_ptr().add(offsetipiv), &incx)
    }
  };
}

macro_rules! impl_lange {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, norm: &str, m: c_int, n: c_int, a: &[$t], offseta: usize, lda: c_int, work: &mut [$t], offsetwork: usize) -> CallResult<$t> {
      let norm = flags::validated("norm", norm, b"M1OIFE")?;
      Ok((self.$sym)(&norm, &m, &n, a.as_ptr().add(offseta), &lda, work.as_mut_ptr().add(offsetwork)))
    }
  };
}

macro_rules! impl_lamch {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, cmach: &str) -> CallResult<$t> {
      let cmach = flags::validated("cmach", cmach, b"ESBPNRMULO")?;
      Ok((self.$sym)(&cmach))
    }
  };
}

impl DynLapack {
  impl_gesv!(dgesv, dgesv_, f64);
  impl_gesv!(sgesv, sgesv_, f32);
  impl_getrf!(dgetrf, dgetrf_, f64);
  impl_getrf!(sgetrf, sgetrf_, f32);
  impl_getrs!(dgetrs, dgetrs_, f64);
  impl_getrs!(sgetrs, sgetrs_, f32);
  impl_getri!(dgetri, dgetri_, f64);
  impl_getri!(sgetri, sgetri_, f32);
  impl_potrf!(dpotrf, dpotrf_, f64);
  impl_potrf!(spotrf, spotrf_, f32);
  impl_potrs!(dpotrs, dpotrs_, f64);
  impl_potrs!(spotrs, spotrs_, f32);
  impl_posv!(dposv, dposv_, f64);
  impl_posv!(sposv, sposv_, f32);
  impl_geqrf!(dgeqrf, dgeqrf_, f64);
  impl_geqrf!(sgeqrf, sgeqrf_, f32);
  impl_orgqr!(dorgqr, dorgqr_, f64);
  impl_orgqr!(sorgqr, sorgqr_, f32);
  impl_gesvd!(dgesvd, dgesvd_, f64);
  impl_gesvd!(sgesvd, sgesvd_, f32);
  impl_syev!(dsyev, dsyev_, f64);
  impl_syev!(ssyev, ssyev_, f32);
  impl_geev!(dgeev, dgeev_, f64);
  impl_geev!(sgeev, sgeev_, f32);
  impl_gels!(dgels, dgels_, f64);
  impl_gels!(sgels, sgels_, f32);
  impl_lacpy!(dlacpy, dlacpy_, f64);
  impl_lacpy!(slacpy, slacpy_, f32);
  impl_laswp!(dlaswp, dlaswp_, f64);
  impl_laswp!(slaswp, slaswp_, f32);
  impl_lange!(dlange, dlange_, f64);
  impl_lange!(slange, slange_, f32);
  impl_lamch!(dlamch, dlamch_, f64);
  impl_lamch!(slamch, slamch_, f32);
}

// ---------------------------------------------------------------------- //

static REGISTRY: OnceCell<Result<DynLapack, LoadError>> = OnceCell::new();

/// Process-wide LAPACK table, loaded from the process properties on first
/// use. A failed load is cached and handed to every later caller.
pub fn lapack() -> Result<&'static DynLapack, LoadError> {
  REGISTRY.get_or_init(DynLapack::load).as_ref().map_err(Clone::clone)
}

// ---------------------------------------------------------------------- //

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::CallError;
  use approx::assert_abs_diff_eq;

  #[cfg(target_os = "linux")]
  const FALLBACK_LIBS: &[&str] = &["liblapack.so.3", "libopenblas.so.0", "libopenblas.so"];
  #[cfg(not(target_os = "linux"))]
  const FALLBACK_LIBS: &[&str] = &[];

  fn lib() -> Option<&'static DynLapack> {
    static LIB: OnceCell<Option<DynLapack>> = OnceCell::new();
    LIB
      .get_or_init(|| {
        if let Ok(l) = DynLapack::load() {
          return Some(l);
        }
        for cand in FALLBACK_LIBS {
          if let Ok(l) = DynLapack::load_from(cand) {
            return Some(l);
          }
        }
        eprintln!("no LAPACK library available, skipping native LAPACK tests");
        None
      })
      .as_ref()
  }

  #[test]
  fn test_dgesv() {
    let Some(lapack) = lib() else { return };
    // [2 1; 1 3] x = [3; 5], column-major
    let mut a = [2., 1., 1., 3.];
    let mut b = [3., 5.];
    let mut ipiv = [0; 2];
    let mut info = -1;
    unsafe { lapack.dgesv(2, 1, &mut a, 0, 2, &mut ipiv, 0, &mut b, 0, 2, &mut info) };
    assert_eq!(info, 0);
    assert_abs_diff_eq!(b[0], 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(b[1], 1.4, epsilon = 1e-12);
  }

  #[test]
  fn test_dsyev_diagonal() {
    let Some(lapack) = lib() else { return };
    let mut a = [3., 0., 0., -1.];
    let mut w = [0.; 2];
    let mut work = [0.; 64];
    let mut info = -1;
    unsafe {
      lapack
        .dsyev("V", "U", 2, &mut a, 0, 2, &mut w, 0, &mut work, 0, 64, &mut info)
        .unwrap()
    };
    assert_eq!(info, 0);
    // eigenvalues in ascending order
    assert_abs_diff_eq!(w[0], -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(w[1], 3.0, epsilon = 1e-12);
  }

  #[test]
  fn test_dsyev_invalid_flag() {
    let Some(lapack) = lib() else { return };
    let mut a = [1., 0., 0., 1.];
    let a_copy = a;
    let mut w = [0.; 2];
    let mut work = [0.; 8];
    let mut info = 0;
    let err = unsafe {
      lapack
        .dsyev("X", "U", 2, &mut a, 0, 2, &mut w, 0, &mut work, 0, 8, &mut info)
        .unwrap_err()
    };
    assert_eq!(err, CallError::InvalidFlag { param: "jobz", value: "X".to_string() });
    // the native call was skipped, nothing was written
    assert_eq!(a, a_copy);
    assert_eq!(info, 0);
  }

  #[test]
  fn test_dgeqrf_workspace_query_then_factor() {
    let Some(lapack) = lib() else { return };
    let (m, n) = (4_usize, 3_usize);
    let orig = crate::blas::tests::random_normal_f64(m * n);
    let mut a = orig.clone();
    let mut tau = vec![0.0; n];
    let mut query = [0.0];
    let mut info = -1;
    unsafe {
      lapack.dgeqrf(m as c_int, n as c_int, &mut a, 0, m as c_int, &mut tau, 0, &mut query, 0, -1, &mut info)
    };
    assert_eq!(info, 0);
    let lwork = query[0] as usize;
    assert!(lwork >= n);
    let mut work = vec![0.0; lwork];
    unsafe {
      lapack.dgeqrf(m as c_int, n as c_int, &mut a, 0, m as c_int, &mut tau, 0, &mut work, 0, lwork as c_int, &mut info)
    };
    assert_eq!(info, 0);
    unsafe {
      lapack.dorgqr(m as c_int, n as c_int, n as c_int, &mut a, 0, m as c_int, &tau, 0, &mut work, 0, lwork as c_int, &mut info)
    };
    assert_eq!(info, 0);
    // columns of q are orthonormal
    for i in 0..n {
      for j in i..n {
        let mut dot = 0.0;
        for r in 0..m {
          dot += a[r + i * m] * a[r + j * m];
        }
        let want = if i == j { 1.0 } else { 0.0 };
        assert_abs_diff_eq!(dot, want, epsilon = 1e-10);
      }
    }
  }

  #[test]
  fn test_dlange_one_norm() {
    let Some(lapack) = lib() else { return };
    let a = [1., -2., 3., -4.]; // columns [1,-2], [3,-4]
    let mut work = [0.0; 2];
    let norm = unsafe { lapack.dlange("1", 2, 2, &a, 0, 2, &mut work, 0).unwrap() };
    assert_abs_diff_eq!(norm, 7.0, epsilon = 1e-12);
  }

  #[test]
  fn test_dlamch() {
    let Some(lapack) = lib() else { return };
    let eps = unsafe { lapack.dlamch("E").unwrap() };
    assert!(eps > 0.0 && eps < 1e-10);
    let err = unsafe { lapack.dlamch("X").unwrap_err() };
    assert!(matches!(err, CallError::InvalidFlag { param: "cmach", .. }));
  }
}
