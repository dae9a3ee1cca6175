//! Runtime-bound BLAS (double and single precision real).
//!
//! Every wrapper mirrors the Fortran parameter list one to one: arrays come
//! with an explicit element offset, strides stay separate integers, and the
//! call blocks the current thread until the native routine returns. Array
//! length preconditions (`offset + required length <= len`) are not checked;
//! violating them is undefined behavior inside the native call, which is why
//! the wrappers are `unsafe`.

use std::ffi::{
  c_char,
  c_int,
  OsStr,
};

use once_cell::sync::OnceCell;

use crate::error::LoadError;
use crate::flags;
use crate::loader;
use crate::loader::{stub_routine, symbol_table};

// ---------------------------------------------------------------------- //

symbol_table! {
  /// Symbol table of a loaded BLAS library. Bound once, immutable afterwards;
  /// dropping it closes the library handle.
  #[derive(Debug)]
  pub struct DynBlas {
    dasum_:  unsafe extern "C" fn(*const c_int, *const f64, *const c_int) -> f64 = "dasum_",
    sasum_:  unsafe extern "C" fn(*const c_int, *const f32, *const c_int) -> f32 = "sasum_",
    dnrm2_:  unsafe extern "C" fn(*const c_int, *const f64, *const c_int) -> f64 = "dnrm2_",
    snrm2_:  unsafe extern "C" fn(*const c_int, *const f32, *const c_int) -> f32 = "snrm2_",
    daxpy_:  unsafe extern "C" fn(*const c_int, *const f64, *const f64, *const c_int, *mut f64, *const c_int) = "daxpy_",
    saxpy_:  unsafe extern "C" fn(*const c_int, *const f32, *const f32, *const c_int, *mut f32, *const c_int) = "saxpy_",
    dcopy_:  unsafe extern "C" fn(*const c_int, *const f64, *const c_int, *mut f64, *const c_int) = "dcopy_",
    scopy_:  unsafe extern "C" fn(*const c_int, *const f32, *const c_int, *mut f32, *const c_int) = "scopy_",
    dswap_:  unsafe extern "C" fn(*const c_int, *mut f64, *const c_int, *mut f64, *const c_int) = "dswap_",
    sswap_:  unsafe extern "C" fn(*const c_int, *mut f32, *const c_int, *mut f32, *const c_int) = "sswap_",
    ddot_:   unsafe extern "C" fn(*const c_int, *const f64, *const c_int, *const f64, *const c_int) -> f64 = "ddot_",
    sdot_:   unsafe extern "C" fn(*const c_int, *const f32, *const c_int, *const f32, *const c_int) -> f32 = "sdot_",
    sdsdot_: unsafe extern "C" fn(*const c_int, *const f32, *const f32, *const c_int, *const f32, *const c_int) -> f32 = "sdsdot_",
    drot_:   unsafe extern "C" fn(*const c_int, *mut f64, *const c_int, *mut f64, *const c_int, *const f64, *const f64) = "drot_",
    srot_:   unsafe extern "C" fn(*const c_int, *mut f32, *const c_int, *mut f32, *const c_int, *const f32, *const f32) = "srot_",
    drotm_:  unsafe extern "C" fn(*const c_int, *mut f64, *const c_int, *mut f64, *const c_int, *const f64) = "drotm_",
    srotm_:  unsafe extern "C" fn(*const c_int, *mut f32, *const c_int, *mut f32, *const c_int, *const f32) = "srotm_",
    dscal_:  unsafe extern "C" fn(*const c_int, *const f64, *mut f64, *const c_int) = "dscal_",
    sscal_:  unsafe extern "C" fn(*const c_int, *const f32, *mut f32, *const c_int) = "sscal_",
    idamax_: unsafe extern "C" fn(*const c_int, *const f64, *const c_int) -> c_int = "idamax_",
    isamax_: unsafe extern "C" fn(*const c_int, *const f32, *const c_int) -> c_int = "isamax_",
    dgemv_:  unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f64, *const f64, *const c_int, *const f64, *const c_int, *const f64, *mut f64, *const c_int) = "dgemv_",
    sgemv_:  unsafe extern "C" fn(*const c_char, *const c_int, *const c_int, *const f32, *const f32, *const c_int, *const f32, *const c_int, *const f32, *mut f32, *const c_int) = "sgemv_",
    dger_:   unsafe extern "C" fn(*const c_int, *const c_int, *const f64, *const f64, *const c_int, *const f64, *const c_int, *mut f64, *const c_int) = "dger_",
    sger_:   unsafe extern "C" fn(*const c_int, *const c_int, *const f32, *const f32, *const c_int, *const f32, *const c_int, *mut f32, *const c_int) = "sger_",
    dsymv_:  unsafe extern "C" fn(*const c_char, *const c_int, *const f64, *const f64, *const c_int, *const f64, *const c_int, *const f64, *mut f64, *const c_int) = "dsymv_",
    ssymv_:  unsafe extern "C" fn(*const c_char, *const c_int, *const f32, *const f32, *const c_int, *const f32, *const c_int, *const f32, *mut f32, *const c_int) = "ssymv_",
    dsyr_:   unsafe extern "C" fn(*const c_char, *const c_int, *const f64, *const f64, *const c_int, *mut f64, *const c_int) = "dsyr_",
    ssyr_:   unsafe extern "C" fn(*const c_char, *const c_int, *const f32, *const f32, *const c_int, *mut f32, *const c_int) = "ssyr_",
    dsyr2_:  unsafe extern "C" fn(*const c_char, *const c_int, *const f64, *const f64, *const c_int, *const f64, *const c_int, *mut f64, *const c_int) = "dsyr2_",
    ssyr2_:  unsafe extern "C" fn(*const c_char, *const c_int, *const f32, *const f32, *const c_int, *const f32, *const c_int, *mut f32, *const c_int) = "ssyr2_",
    dgemm_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *const c_int, *const f64, *const f64, *const c_int, *const f64, *const c_int, *const f64, *mut f64, *const c_int) = "dgemm_",
    sgemm_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *const c_int, *const f32, *const f32, *const c_int, *const f32, *const c_int, *const f32, *mut f32, *const c_int) = "sgemm_",
    dsymm_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *const f64, *const f64, *const c_int, *const f64, *const c_int, *const f64, *mut f64, *const c_int) = "dsymm_",
    ssymm_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *const f32, *const f32, *const c_int, *const f32, *const c_int, *const f32, *mut f32, *const c_int) = "ssymm_",
    dsyrk_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *const f64, *const f64, *const c_int, *const f64, *mut f64, *const c_int) = "dsyrk_",
    ssyrk_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *const f32, *const f32, *const c_int, *const f32, *mut f32, *const c_int) = "ssyrk_",
    dsyr2k_: unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *const f64, *const f64, *const c_int, *const f64, *const c_int, *const f64, *mut f64, *const c_int) = "dsyr2k_",
    ssyr2k_: unsafe extern "C" fn(*const c_char, *const c_char, *const c_int, *const c_int, *const f32, *const f32, *const c_int, *const f32, *const c_int, *const f32, *mut f32, *const c_int) = "ssyr2k_",
    dtrmm_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_char, *const c_char, *const c_int, *const c_int, *const f64, *const f64, *const c_int, *mut f64, *const c_int) = "dtrmm_",
    strmm_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_char, *const c_char, *const c_int, *const c_int, *const f32, *const f32, *const c_int, *mut f32, *const c_int) = "strmm_",
    dtrsm_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_char, *const c_char, *const c_int, *const c_int, *const f64, *const f64, *const c_int, *mut f64, *const c_int) = "dtrsm_",
    strsm_:  unsafe extern "C" fn(*const c_char, *const c_char, *const c_char, *const c_char, *const c_int, *const c_int, *const f32, *const f32, *const c_int, *mut f32, *const c_int) = "strsm_",
  }
  probe {
    "drotmg_", "srotmg_",
    "dgbmv_", "sgbmv_",
    "dsbmv_", "ssbmv_",
    "dspmv_", "sspmv_",
    "dspr_", "sspr_",
    "dspr2_", "sspr2_",
    "dtbmv_", "stbmv_",
    "dtbsv_", "stbsv_",
    "dtpmv_", "stpmv_",
    "dtpsv_", "stpsv_",
    "dtrmv_", "strmv_",
    "dtrsv_", "strsv_",
  }
}

impl DynBlas {
  /// Opens the library named by the `BLAS_NATIVE_LIB_PATH` / `BLAS_NATIVE_LIB`
  /// process properties (default short name `blas`) and binds every symbol.
  pub fn load() -> Result<Self, LoadError> {
    Self::bind(loader::open("blas", "blas")?)
  }

  /// Opens an explicitly named library file, bypassing the process properties.
  pub fn load_from(path: impl AsRef<OsStr>) -> Result<Self, LoadError> {
    Self::bind(loader::open_path("blas", path.as_ref())?)
  }
}

// ---------------------------------------------------------------------- //

macro_rules! impl_asum {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, x: &[$t], offsetx: usize, incx: c_int) -> $t {
      (self.$sym)(&n, x.as_ptr().add(offsetx), &incx)
    }
  };
}

macro_rules! impl_axpy {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, alpha: $t, x: &[$t], offsetx: usize, incx: c_int, y: &mut [$t], offsety: usize, incy: c_int) {
      (self.$sym)(&n, &alpha, x.as_ptr().add(offsetx), &incx, y.as_mut_ptr().add(offsety), &incy)
    }
  };
}

macro_rules! impl_copy {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, x: &[$t], offsetx: usize, incx: c_int, y: &mut [$t], offsety: usize, incy: c_int) {
      (self.$sym)(&n, x.as_ptr().add(offsetx), &incx, y.as_mut_ptr().add(offsety), &incy)
    }
  };
}

macro_rules! impl_swap {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, x: &mut [$t], offsetx: usize, incx: c_int, y: &mut [$t], offsety: usize, incy: c_int) {
      (self.$sym)(&n, x.as_mut_ptr().add(offsetx), &incx, y.as_mut_ptr().add(offsety), &incy)
    }
  };
}

macro_rules! impl_dot {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, x: &[$t], offsetx: usize, incx: c_int, y: &[$t], offsety: usize, incy: c_int) -> $t {
      (self.$sym)(&n, x.as_ptr().add(offsetx), &incx, y.as_ptr().add(offsety), &incy)
    }
  };
}

macro_rules! impl_rot {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, x: &mut [$t], offsetx: usize, incx: c_int, y: &mut [$t], offsety: usize, incy: c_int, c: $t, s: $t) {
      (self.$sym)(&n, x.as_mut_ptr().add(offsetx), &incx, y.as_mut_ptr().add(offsety), &incy, &c, &s)
    }
  };
}

macro_rules! impl_rotm {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, x: &mut [$t], offsetx: usize, incx: c_int, y: &mut [$t], offsety: usize, incy: c_int, param: &[$t], offsetparam: usize) {
      (self.$sym)(&n, x.as_mut_ptr().add(offsetx), &incx, y.as_mut_ptr().add(offsety), &incy, param.as_ptr().add(offsetparam))
    }
  };
}

macro_rules! impl_scal {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, n: c_int, alpha: $t, x: &mut [$t], offsetx: usize, incx: c_int) {
      (self.$sym)(&n, &alpha, x.as_mut_ptr().add(offsetx), &incx)
    }
  };
}

macro_rules! impl_iamax {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    /// Returns the 0-based index of the element of largest absolute value
    /// (the native routine reports a 1-based index).
    pub unsafe fn $fn_name(&self, n: c_int, x: &[$t], offsetx: usize, incx: c_int) -> c_int {
      (self.$sym)(&n, x.as_ptr().add(offsetx), &incx) - 1
    }
  };
}

macro_rules! impl_gemv {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, trans: &str, m: c_int, n: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, x: &[$t], offsetx: usize, incx: c_int, beta: $t, y: &mut [$t], offsety: usize, incy: c_int) {
      let trans = flags::first_char(trans);
      (self.$sym)(&trans, &m, &n, &alpha, a.as_ptr().add(offseta), &lda, x.as_ptr().add(offsetx), &incx, &beta, y.as_mut_ptr().add(offsety), &incy)
    }
  };
}

macro_rules! impl_ger {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, m: c_int, n: c_int, alpha: $t, x: &[$t], offsetx: usize, incx: c_int, y: &[$t], offsety: usize, incy: c_int, a: &mut [$t], offseta: usize, lda: c_int) {
      (self.$sym)(&m, &n, &alpha, x.as_ptr().add(offsetx), &incx, y.as_ptr().add(offsety), &incy, a.as_mut_ptr().add(offseta), &lda)
    }
  };
}

macro_rules! impl_symv {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, n: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, x: &[$t], offsetx: usize, incx: c_int, beta: $t, y: &mut [$t], offsety: usize, incy: c_int) {
      let uplo = flags::first_char(uplo);
      (self.$sym)(&uplo, &n, &alpha, a.as_ptr().add(offseta), &lda, x.as_ptr().add(offsetx), &incx, &beta, y.as_mut_ptr().add(offsety), &incy)
    }
  };
}

macro_rules! impl_syr {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, n: c_int, alpha: $t, x: &[$t], offsetx: usize, incx: c_int, a: &mut [$t], offseta: usize, lda: c_int) {
      let uplo = flags::first_char(uplo);
      (self.$sym)(&uplo, &n, &alpha, x.as_ptr().add(offsetx), &incx, a.as_mut_ptr().add(offseta), &lda)
    }
  };
}

macro_rules! impl_syr2 {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, n: c_int, alpha: $t, x: &[$t], offsetx: usize, incx: c_int, y: &[$t], offsety: usize, incy: c_int, a: &mut [$t], offseta: usize, lda: c_int) {
      let uplo = flags::first_char(uplo);
      (self.$sym)(&uplo, &n, &alpha, x.as_ptr().add(offsetx), &incx, y.as_ptr().add(offsety), &incy, a.as_mut_ptr().add(offseta), &lda)
    }
  };
}

macro_rules! impl_gemm {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, transa: &str, transb: &str, m: c_int, n: c_int, k: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, b: &[$t], offsetb: usize, ldb: c_int, beta: $t, c: &mut [$t], offsetc: usize, ldc: c_int) {
      let transa = flags::first_char(transa);
      let transb = flags::first_char(transb);
      (self.$sym)(&transa, &transb, &m, &n, &k, &alpha, a.as_ptr().add(offseta), &lda, b.as_ptr().add(offsetb), &ldb, &beta, c.as_mut_ptr().add(offsetc), &ldc)
    }
  };
}

macro_rules! impl_symm {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, side: &str, uplo: &str, m: c_int, n: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, b: &[$t], offsetb: usize, ldb: c_int, beta: $t, c: &mut [$t], offsetc: usize, ldc: c_int) {
      let side = flags::first_char(side);
      let uplo = flags::first_char(uplo);
      (self.$sym)(&side, &uplo, &m, &n, &alpha, a.as_ptr().add(offseta), &lda, b.as_ptr().add(offsetb), &ldb, &beta, c.as_mut_ptr().add(offsetc), &ldc)
    }
  };
}

macro_rules! impl_syrk {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, trans: &str, n: c_int, k: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, beta: $t, c: &mut [$t], offsetc: usize, ldc: c_int) {
      let uplo = flags::first_char(uplo);
      let trans = flags::first_char(trans);
      (self.$sym)(&uplo, &trans, &n, &k, &alpha, a.as_ptr().add(offseta), &lda, &beta, c.as_mut_ptr().add(offsetc), &ldc)
    }
  };
}

macro_rules! impl_syr2k {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, uplo: &str, trans: &str, n: c_int, k: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, b: &[$t], offsetb: usize, ldb: c_int, beta: $t, c: &mut [$t], offsetc: usize, ldc: c_int) {
      let uplo = flags::first_char(uplo);
      let trans = flags::first_char(trans);
      (self.$sym)(&uplo, &trans, &n, &k, &alpha, a.as_ptr().add(offseta), &lda, b.as_ptr().add(offsetb), &ldb, &beta, c.as_mut_ptr().add(offsetc), &ldc)
    }
  };
}

macro_rules! impl_trmm {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, side: &str, uplo: &str, transa: &str, diag: &str, m: c_int, n: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, b: &mut [$t], offsetb: usize, ldb: c_int) {
      let side = flags::first_char(side);
      let uplo = flags::first_char(uplo);
      let transa = flags::first_char(transa);
      let diag = flags::first_char(diag);
      (self.$sym)(&side, &uplo, &transa, &diag, &m, &n, &alpha, a.as_ptr().add(offseta), &lda, b.as_mut_ptr().add(offsetb), &ldb)
    }
  };
}

impl DynBlas {
  impl_asum!(dasum, dasum_, f64);
  impl_asum!(sasum, sasum_, f32);
  impl_asum!(dnrm2, dnrm2_, f64);
  impl_asum!(snrm2, snrm2_, f32);
  impl_axpy!(daxpy, daxpy_, f64);
  impl_axpy!(saxpy, saxpy_, f32);
  impl_copy!(dcopy, dcopy_, f64);
  impl_copy!(scopy, scopy_, f32);
  impl_swap!(dswap, dswap_, f64);
  impl_swap!(sswap, sswap_, f32);
  impl_dot!(ddot, ddot_, f64);
  impl_dot!(sdot, sdot_, f32);
  impl_rot!(drot, drot_, f64);
  impl_rot!(srot, srot_, f32);
  impl_rotm!(drotm, drotm_, f64);
  impl_rotm!(srotm, srotm_, f32);
  impl_scal!(dscal, dscal_, f64);
  impl_scal!(sscal, sscal_, f32);
  impl_iamax!(idamax, idamax_, f64);
  impl_iamax!(isamax, isamax_, f32);
  impl_gemv!(dgemv, dgemv_, f64);
  impl_gemv!(sgemv, sgemv_, f32);
  impl_ger!(dger, dger_, f64);
  impl_ger!(sger, sger_, f32);
  impl_symv!(dsymv, dsymv_, f64);
  impl_symv!(ssymv, ssymv_, f32);
  impl_syr!(dsyr, dsyr_, f64);
  impl_syr!(ssyr, ssyr_, f32);
  impl_syr2!(dsyr2, dsyr2_, f64);
  impl_syr2!(ssyr2, ssyr2_, f32);
  impl_gemm!(dgemm, dgemm_, f64);
  impl_gemm!(sgemm, sgemm_, f32);
  impl_symm!(dsymm, dsymm_, f64);
  impl_symm!(ssymm, ssymm_, f32);
  impl_syrk!(dsyrk, dsyrk_, f64);
  impl_syrk!(ssyrk, ssyrk_, f32);
  impl_syr2k!(dsyr2k, dsyr2k_, f64);
  impl_syr2k!(ssyr2k, ssyr2k_, f32);
  impl_trmm!(dtrmm, dtrmm_, f64);
  impl_trmm!(strmm, strmm_, f32);
  impl_trmm!(dtrsm, dtrsm_, f64);
  impl_trmm!(strsm, strsm_, f32);

  /// Single-precision dot product accumulated in double precision.
  pub unsafe fn sdsdot(&self, n: c_int, sb: f32, x: &[f32], offsetx: usize, incx: c_int, y: &[f32], offsety: usize, incy: c_int) -> f32 {
    (self.sdsdot_)(&n, &sb, x.as_ptr().add(offsetx), &incx, y.as_ptr().add(offsety), &incy)
  }
}

// ---------------------------------------------------------------------- //

// Packed/banded storage and the triangular matrix-vector/solve variants have
// no wrappers yet; their symbols are still resolved at load time so an
// incomplete library fails fast.

macro_rules! impl_rotmg_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(d1: &mut $t, d2: &mut $t, x1: &mut $t, y1: $t, param: &mut [$t], offsetparam: usize) }
  };
}

macro_rules! impl_gbmv_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(trans: &str, m: c_int, n: c_int, kl: c_int, ku: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, x: &[$t], offsetx: usize, incx: c_int, beta: $t, y: &mut [$t], offsety: usize, incy: c_int) }
  };
}

macro_rules! impl_sbmv_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(uplo: &str, n: c_int, k: c_int, alpha: $t, a: &[$t], offseta: usize, lda: c_int, x: &[$t], offsetx: usize, incx: c_int, beta: $t, y: &mut [$t], offsety: usize, incy: c_int) }
  };
}

macro_rules! impl_spmv_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(uplo: &str, n: c_int, alpha: $t, ap: &[$t], offsetap: usize, x: &[$t], offsetx: usize, incx: c_int, beta: $t, y: &mut [$t], offsety: usize, incy: c_int) }
  };
}

macro_rules! impl_spr_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(uplo: &str, n: c_int, alpha: $t, x: &[$t], offsetx: usize, incx: c_int, ap: &mut [$t], offsetap: usize) }
  };
}

macro_rules! impl_spr2_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(uplo: &str, n: c_int, alpha: $t, x: &[$t], offsetx: usize, incx: c_int, y: &[$t], offsety: usize, incy: c_int, ap: &mut [$t], offsetap: usize) }
  };
}

macro_rules! impl_tbmv_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(uplo: &str, trans: &str, diag: &str, n: c_int, k: c_int, a: &[$t], offseta: usize, lda: c_int, x: &mut [$t], offsetx: usize, incx: c_int) }
  };
}

macro_rules! impl_tpmv_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(uplo: &str, trans: &str, diag: &str, n: c_int, ap: &[$t], offsetap: usize, x: &mut [$t], offsetx: usize, incx: c_int) }
  };
}

macro_rules! impl_trmv_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(uplo: &str, trans: &str, diag: &str, n: c_int, a: &[$t], offseta: usize, lda: c_int, x: &mut [$t], offsetx: usize, incx: c_int) }
  };
}

impl DynBlas {
  impl_rotmg_stub!(drotmg, f64);
  impl_rotmg_stub!(srotmg, f32);
  impl_gbmv_stub!(dgbmv, f64);
  impl_gbmv_stub!(sgbmv, f32);
  impl_sbmv_stub!(dsbmv, f64);
  impl_sbmv_stub!(ssbmv, f32);
  impl_spmv_stub!(dspmv, f64);
  impl_spmv_stub!(sspmv, f32);
  impl_spr_stub!(dspr, f64);
  impl_spr_stub!(sspr, f32);
  impl_spr2_stub!(dspr2, f64);
  impl_spr2_stub!(sspr2, f32);
  impl_tbmv_stub!(dtbmv, f64);
  impl_tbmv_stub!(stbmv, f32);
  impl_tbmv_stub!(dtbsv, f64);
  impl_tbmv_stub!(stbsv, f32);
  impl_tpmv_stub!(dtpmv, f64);
  impl_tpmv_stub!(stpmv, f32);
  impl_tpmv_stub!(dtpsv, f64);
  impl_tpmv_stub!(stpsv, f32);
  impl_trmv_stub!(dtrmv, f64);
  impl_trmv_stub!(strmv, f32);
  impl_trmv_stub!(dtrsv, f64);
  impl_trmv_stub!(strsv, f32);
}

// ---------------------------------------------------------------------- //

static REGISTRY: OnceCell<Result<DynBlas, LoadError>> = OnceCell::new();

/// Process-wide BLAS table, loaded from the process properties on first use.
/// A failed load is cached and handed to every later caller; nothing retries.
pub fn blas() -> Result<&'static DynBlas, LoadError> {
  REGISTRY.get_or_init(DynBlas::load).as_ref().map_err(Clone::clone)
}

// ---------------------------------------------------------------------- //

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::error::CallError;
  use approx::assert_abs_diff_eq;
  use rand::Rng;
  use rand_distr::StandardNormal;

  #[cfg(target_os = "linux")]
  const FALLBACK_LIBS: &[&str] = &["libblas.so.3", "libopenblas.so.0", "libopenblas.so", "libcblas.so.3"];
  #[cfg(not(target_os = "linux"))]
  const FALLBACK_LIBS: &[&str] = &[];

  pub(crate) fn lib() -> Option<&'static DynBlas> {
    static LIB: OnceCell<Option<DynBlas>> = OnceCell::new();
    LIB
      .get_or_init(|| {
        if let Ok(b) = DynBlas::load() {
          return Some(b);
        }
        for cand in FALLBACK_LIBS {
          if let Ok(b) = DynBlas::load_from(cand) {
            return Some(b);
          }
        }
        eprintln!("no BLAS library available, skipping native BLAS tests");
        None
      })
      .as_ref()
  }

  pub(crate) fn random_normal_f64(size: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.sample(StandardNormal)).collect()
  }

  #[test]
  fn test_daxpy() {
    let Some(blas) = lib() else { return };
    let x = [1., 1., 1.];
    let mut y = [0., 0., 0.];
    unsafe { blas.daxpy(3, 2.0, &x, 0, 1, &mut y, 0, 1) };
    assert_eq!(y, [2., 2., 2.]);
    assert_eq!(x, [1., 1., 1.]);
  }

  #[test]
  fn test_daxpy_with_offsets() {
    let Some(blas) = lib() else { return };
    let x = [99., 1., 2.];
    let mut y = [99., 99., 10., 20.];
    unsafe { blas.daxpy(2, 1.0, &x, 1, 1, &mut y, 2, 1) };
    assert_eq!(y, [99., 99., 11., 22.]);
  }

  #[test]
  fn test_ddot() {
    let Some(blas) = lib() else { return };
    let x = [1., 2., 3.];
    let y = [4., 5., 6.];
    let r = unsafe { blas.ddot(3, &x, 0, 1, &y, 0, 1) };
    assert_abs_diff_eq!(r, 32.0);
  }

  #[test]
  fn test_dnrm2() {
    let Some(blas) = lib() else { return };
    let x = [3., 4.];
    let r = unsafe { blas.dnrm2(2, &x, 0, 1) };
    assert_abs_diff_eq!(r, 5.0, epsilon = 1e-12);
  }

  #[test]
  fn test_dscal_strided() {
    let Some(blas) = lib() else { return };
    let mut x = [1., 2., 3., 4.];
    unsafe { blas.dscal(2, 10.0, &mut x, 0, 2) };
    assert_eq!(x, [10., 2., 30., 4.]);
  }

  #[test]
  fn test_idamax() {
    let Some(blas) = lib() else { return };
    let x = [3.0, -7.0, 2.0, -7.5];
    let i = unsafe { blas.idamax(4, &x, 0, 1) };
    assert_eq!(i, 3);
  }

  #[test]
  fn test_idamax_single_element() {
    let Some(blas) = lib() else { return };
    let x = [42.0];
    assert_eq!(unsafe { blas.idamax(1, &x, 0, 1) }, 0);
  }

  #[test]
  fn test_dgemm_against_naive() {
    let Some(blas) = lib() else { return };
    let (m, k, n) = (4, 6, 5);
    let a = random_normal_f64(m * k);
    let b = random_normal_f64(k * n);
    let mut c = vec![0.0; m * n];
    // column-major reference product
    let mut expected = vec![0.0; m * n];
    for j in 0..n {
      for i in 0..m {
        for l in 0..k {
          expected[i + j * m] += a[i + l * m] * b[l + j * k];
        }
      }
    }
    unsafe {
      blas.dgemm("N", "N", m as c_int, n as c_int, k as c_int, 1.0, &a, 0, m as c_int, &b, 0, k as c_int, 0.0, &mut c, 0, m as c_int)
    };
    for (got, want) in c.iter().zip(expected.iter()) {
      assert_abs_diff_eq!(*got, *want, epsilon = 1e-10);
    }
  }

  #[test]
  fn test_dswap() {
    let Some(blas) = lib() else { return };
    let mut x = [1., 2.];
    let mut y = [3., 4.];
    unsafe { blas.dswap(2, &mut x, 0, 1, &mut y, 0, 1) };
    assert_eq!(x, [3., 4.]);
    assert_eq!(y, [1., 2.]);
  }

  #[test]
  fn test_unimplemented_stub() {
    let Some(blas) = lib() else { return };
    let a = [1.0, 0.0, 0.0, 1.0];
    let mut x = [1.0, 2.0];
    let err = blas.dtrmv("U", "N", "N", 2, &a, 0, 2, &mut x, 0, 1).unwrap_err();
    assert_eq!(err, CallError::Unsupported("dtrmv"));
    // the stub never touches its arguments
    assert_eq!(x, [1.0, 2.0]);
  }

  #[test]
  #[cfg(target_os = "linux")]
  fn test_missing_symbol_fails_whole_load() {
    // libm loads fine but exports no BLAS symbols, so binding must fail on
    // the first lookup and no table is constructed
    let err = DynBlas::load_from("libm.so.6").unwrap_err();
    assert!(matches!(err, LoadError::MissingSymbol(_)), "expected MissingSymbol, got {:?}", err);
  }

  #[test]
  fn test_registry_is_stable() {
    let first = blas().map(|b| b as *const DynBlas);
    let second = blas().map(|b| b as *const DynBlas);
    match (first, second) {
      (Ok(a), Ok(b)) => assert_eq!(a, b),
      (Err(a), Err(b)) => assert_eq!(a, b),
      _ => panic!("registry changed its answer between calls"),
    }
  }
}
