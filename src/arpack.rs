//! Runtime-bound ARPACK (double and single precision real).
//!
//! The reverse-communication drivers (`*aupd`) and the eigenvector extraction
//! routines (`*eupd`) keep the Fortran parameter order exactly, with `ido`,
//! `nev` and `info` as direct in/out scalars. The two-letter spectrum codes
//! (`bmat`, `which`, `howmny`) are passed as raw string bytes, so they must be
//! at least as long as the native routine reads (one or two characters).
//!
//! Selection masks are `&mut [bool]` on this side but int-sized LOGICALs on
//! the native side; the wrappers copy through a scratch `c_int` buffer in both
//! directions, since ARPACK documents `select` as workspace it may overwrite.

use std::ffi::{
  c_char,
  c_int,
  OsStr,
};

use once_cell::sync::OnceCell;

use crate::error::{CallError, CallResult, LoadError};
use crate::loader;
use crate::loader::{stub_routine, symbol_table};

// ---------------------------------------------------------------------- //

symbol_table! {
  /// Symbol table of a loaded ARPACK library.
  pub struct DynArpack {
    dsaupd_: unsafe extern "C" fn(*mut c_int, *const c_char, *const c_int, *const c_char, *const c_int, *const f64, *mut f64, *const c_int, *mut f64, *const c_int, *mut c_int, *mut c_int, *mut f64, *mut f64, *const c_int, *mut c_int) = "dsaupd_",
    ssaupd_: unsafe extern "C" fn(*mut c_int, *const c_char, *const c_int, *const c_char, *const c_int, *const f32, *mut f32, *const c_int, *mut f32, *const c_int, *mut c_int, *mut c_int, *mut f32, *mut f32, *const c_int, *mut c_int) = "ssaupd_",
    dnaupd_: unsafe extern "C" fn(*mut c_int, *const c_char, *const c_int, *const c_char, *const c_int, *const f64, *mut f64, *const c_int, *mut f64, *const c_int, *mut c_int, *mut c_int, *mut f64, *mut f64, *const c_int, *mut c_int) = "dnaupd_",
    snaupd_: unsafe extern "C" fn(*mut c_int, *const c_char, *const c_int, *const c_char, *const c_int, *const f32, *mut f32, *const c_int, *mut f32, *const c_int, *mut c_int, *mut c_int, *mut f32, *mut f32, *const c_int, *mut c_int) = "snaupd_",
    dseupd_: unsafe extern "C" fn(*const c_int, *const c_char, *mut c_int, *mut f64, *mut f64, *const c_int, *const f64, *const c_char, *const c_int, *const c_char, *mut c_int, *const f64, *mut f64, *const c_int, *mut f64, *const c_int, *mut c_int, *mut c_int, *mut f64, *mut f64, *const c_int, *mut c_int) = "dseupd_",
    sseupd_: unsafe extern "C" fn(*const c_int, *const c_char, *mut c_int, *mut f32, *mut f32, *const c_int, *const f32, *const c_char, *const c_int, *const c_char, *mut c_int, *const f32, *mut f32, *const c_int, *mut f32, *const c_int, *mut c_int, *mut c_int, *mut f32, *mut f32, *const c_int, *mut c_int) = "sseupd_",
    dneupd_: unsafe extern "C" fn(*const c_int, *const c_char, *mut c_int, *mut f64, *mut f64, *mut f64, *const c_int, *const f64, *const f64, *mut f64, *const c_char, *const c_int, *const c_char, *mut c_int, *const f64, *mut f64, *const c_int, *mut f64, *const c_int, *mut c_int, *mut c_int, *mut f64, *mut f64, *const c_int, *mut c_int) = "dneupd_",
    sneupd_: unsafe extern "C" fn(*const c_int, *const c_char, *mut c_int, *mut f32, *mut f32, *mut f32, *const c_int, *const f32, *const f32, *mut f32, *const c_char, *const c_int, *const c_char, *mut c_int, *const f32, *mut f32, *const c_int, *mut f32, *const c_int, *mut c_int, *mut c_int, *mut f32, *mut f32, *const c_int, *mut c_int) = "sneupd_",
  }
  // dlaqrb_/slaqrb_ are deliberately not resolved: their wrappers below are
  // permanent stubs and most ARPACK builds do not export the symbols at all.
  probe {}
}

impl DynArpack {
  /// Opens the library named by the `ARPACK_NATIVE_LIB_PATH` /
  /// `ARPACK_NATIVE_LIB` process properties (default short name `arpack`).
  pub fn load() -> Result<Self, LoadError> {
    Self::bind(loader::open("arpack", "arpack")?)
  }

  pub fn load_from(path: impl AsRef<OsStr>) -> Result<Self, LoadError> {
    Self::bind(loader::open_path("arpack", path.as_ref())?)
  }
}

// ---------------------------------------------------------------------- //

/// Copies a bool selection mask into an int-sized scratch buffer. The only
/// fallible acquisition step of this module; on failure the native call is
/// skipped entirely.
fn mask_to_ints(select: &[bool]) -> CallResult<Vec<c_int>> {
  let mut mask = Vec::new();
  mask.try_reserve_exact(select.len()).map_err(|_| CallError::OutOfMemory)?;
  mask.extend(select.iter().map(|&b| b as c_int));
  Ok(mask)
}

fn mask_write_back(select: &mut [bool], mask: &[c_int]) {
  for (dst, src) in select.iter_mut().zip(mask.iter()) {
    *dst = *src != 0;
  }
}

macro_rules! impl_aupd {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, ido: &mut c_int, bmat: &str, n: c_int, which: &str, nev: c_int, tol: $t, resid: &mut [$t], offsetresid: usize, ncv: c_int, v: &mut [$t], offsetv: usize, ldv: c_int, iparam: &mut [c_int], offsetiparam: usize, ipntr: &mut [c_int], offsetipntr: usize, workd: &mut [$t], offsetworkd: usize, workl: &mut [$t], offsetworkl: usize, lworkl: c_int, info: &mut c_int) {
      (self.$sym)(
        ido,
        bmat.as_ptr() as *const c_char,
        &n,
        which.as_ptr() as *const c_char,
        &nev,
        &tol,
        resid.as_mut_ptr().add(offsetresid),
        &ncv,
        v.as_mut_ptr().add(offsetv),
        &ldv,
        iparam.as_mut_ptr().add(offsetiparam),
        ipntr.as_mut_ptr().add(offsetipntr),
        workd.as_mut_ptr().add(offsetworkd),
        workl.as_mut_ptr().add(offsetworkl),
        &lworkl,
        info,
      )
    }
  };
}

macro_rules! impl_seupd {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, rvec: bool, howmny: &str, select: &mut [bool], offsetselect: usize, d: &mut [$t], offsetd: usize, z: &mut [$t], offsetz: usize, ldz: c_int, sigma: $t, bmat: &str, n: c_int, which: &str, nev: &mut c_int, tol: $t, resid: &mut [$t], offsetresid: usize, ncv: c_int, v: &mut [$t], offsetv: usize, ldv: c_int, iparam: &mut [c_int], offsetiparam: usize, ipntr: &mut [c_int], offsetipntr: usize, workd: &mut [$t], offsetworkd: usize, workl: &mut [$t], offsetworkl: usize, lworkl: c_int, info: &mut c_int) -> CallResult<()> {
      let rvec = rvec as c_int;
      let mut mask = mask_to_ints(select)?;
      (self.$sym)(
        &rvec,
        howmny.as_ptr() as *const c_char,
        mask.as_mut_ptr().add(offsetselect),
        d.as_mut_ptr().add(offsetd),
        z.as_mut_ptr().add(offsetz),
        &ldz,
        &sigma,
        bmat.as_ptr() as *const c_char,
        &n,
        which.as_ptr() as *const c_char,
        nev,
        &tol,
        resid.as_mut_ptr().add(offsetresid),
        &ncv,
        v.as_mut_ptr().add(offsetv),
        &ldv,
        iparam.as_mut_ptr().add(offsetiparam),
        ipntr.as_mut_ptr().add(offsetipntr),
        workd.as_mut_ptr().add(offsetworkd),
        workl.as_mut_ptr().add(offsetworkl),
        &lworkl,
        info,
      );
      mask_write_back(select, &mask);
      Ok(())
    }
  };
}

macro_rules! impl_neupd {
  ($fn_name:ident, $sym:ident, $t:ty) => {
    pub unsafe fn $fn_name(&self, rvec: bool, howmny: &str, select: &mut [bool], offsetselect: usize, dr: &mut [$t], offsetdr: usize, di: &mut [$t], offsetdi: usize, z: &mut [$t], offsetz: usize, ldz: c_int, sigmar: $t, sigmai: $t, workev: &mut [$t], offsetworkev: usize, bmat: &str, n: c_int, which: &str, nev: &mut c_int, tol: $t, resid: &mut [$t], offsetresid: usize, ncv: c_int, v: &mut [$t], offsetv: usize, ldv: c_int, iparam: &mut [c_int], offsetiparam: usize, ipntr: &mut [c_int], offsetipntr: usize, workd: &mut [$t], offsetworkd: usize, workl: &mut [$t], offsetworkl: usize, lworkl: c_int, info: &mut c_int) -> CallResult<()> {
      let rvec = rvec as c_int;
      let mut mask = mask_to_ints(select)?;
      (self.$sym)(
        &rvec,
        howmny.as_ptr() as *const c_char,
        mask.as_mut_ptr().add(offsetselect),
        dr.as_mut_ptr().add(offsetdr),
        di.as_mut_ptr().add(offsetdi),
        z.as_mut_ptr().add(offsetz),
        &ldz,
        &sigmar,
        &sigmai,
        workev.as_mut_ptr().add(offsetworkev),
        bmat.as_ptr() as *const c_char,
        &n,
        which.as_ptr() as *const c_char,
        nev,
        &tol,
        resid.as_mut_ptr().add(offsetresid),
        &ncv,
        v.as_mut_ptr().add(offsetv),
        &ldv,
        iparam.as_mut_ptr().add(offsetiparam),
        ipntr.as_mut_ptr().add(offsetipntr),
        workd.as_mut_ptr().add(offsetworkd),
        workl.as_mut_ptr().add(offsetworkl),
        &lworkl,
        info,
      );
      mask_write_back(select, &mask);
      Ok(())
    }
  };
}

macro_rules! impl_laqrb_stub {
  ($fn_name:ident, $t:ty) => {
    stub_routine! { $fn_name(wantt: bool, n: c_int, ilo: c_int, ihi: c_int, h: &mut [$t], offseth: usize, ldh: c_int, wr: &mut [$t], offsetwr: usize, wi: &mut [$t], offsetwi: usize, z: &mut [$t], offsetz: usize, info: &mut c_int) }
  };
}

impl DynArpack {
  impl_aupd!(dsaupd, dsaupd_, f64);
  impl_aupd!(ssaupd, ssaupd_, f32);
  impl_aupd!(dnaupd, dnaupd_, f64);
  impl_aupd!(snaupd, snaupd_, f32);
  impl_seupd!(dseupd, dseupd_, f64);
  impl_seupd!(sseupd, sseupd_, f32);
  impl_neupd!(dneupd, dneupd_, f64);
  impl_neupd!(sneupd, sneupd_, f32);
  impl_laqrb_stub!(dlaqrb, f64);
  impl_laqrb_stub!(slaqrb, f32);
}

// ---------------------------------------------------------------------- //

static REGISTRY: OnceCell<Result<DynArpack, LoadError>> = OnceCell::new();

/// Process-wide ARPACK table, loaded from the process properties on first
/// use. A failed load is cached and handed to every later caller.
pub fn arpack() -> Result<&'static DynArpack, LoadError> {
  REGISTRY.get_or_init(DynArpack::load).as_ref().map_err(Clone::clone)
}

// ---------------------------------------------------------------------- //

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  #[cfg(target_os = "linux")]
  const FALLBACK_LIBS: &[&str] = &["libarpack.so.2", "libarpack.so"];
  #[cfg(not(target_os = "linux"))]
  const FALLBACK_LIBS: &[&str] = &[];

  pub(crate) fn lib() -> Option<&'static DynArpack> {
    static LIB: OnceCell<Option<DynArpack>> = OnceCell::new();
    LIB
      .get_or_init(|| {
        if let Ok(a) = DynArpack::load() {
          return Some(a);
        }
        for cand in FALLBACK_LIBS {
          if let Ok(a) = DynArpack::load_from(cand) {
            return Some(a);
          }
        }
        eprintln!("no ARPACK library available, skipping native ARPACK tests");
        None
      })
      .as_ref()
  }

  #[test]
  fn test_mask_round_trip() {
    let mask = mask_to_ints(&[true, false, true]).unwrap();
    assert_eq!(mask, vec![1, 0, 1]);
    // the scratch buffer is sized up front in one reservation
    assert!(mask.capacity() >= 3);
    let mut select = [false, false, false];
    mask_write_back(&mut select, &[0, 1, 1]);
    assert_eq!(select, [false, true, true]);
  }

  #[test]
  fn test_empty_mask_allocates_nothing() {
    let mask = mask_to_ints(&[]).unwrap();
    assert_eq!(mask.len(), 0);
    assert_eq!(mask.capacity(), 0);
  }

  #[test]
  fn test_laqrb_stub() {
    let Some(arpack) = lib() else { return };
    let mut h = [1.0, 0.0, 0.0, 1.0];
    let mut wr = [0.0; 2];
    let mut wi = [0.0; 2];
    let mut z = [0.0; 4];
    let mut info = 0;
    let err = arpack
      .dlaqrb(true, 2, 1, 2, &mut h, 0, 2, &mut wr, 0, &mut wi, 0, &mut z, 0, &mut info)
      .unwrap_err();
    assert_eq!(err, CallError::Unsupported("dlaqrb"));
    assert_eq!(info, 0);
  }
}
