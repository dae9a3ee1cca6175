//! Dynamically bound BLAS, LAPACK and ARPACK.
//!
//! Each backend library is opened at runtime with `dlopen` semantics; which
//! file is opened is controlled per module by the process properties
//! `<MODULE>_NATIVE_LIB_PATH` (a path used verbatim) and
//! `<MODULE>_NATIVE_LIB` (a short name expanded to the platform file name),
//! with `blas`, `lapack` and `arpack` as the default short names. Every
//! required symbol is resolved up front; one missing symbol fails the whole
//! module.
//!
//! The wrappers mirror the Fortran parameter lists one to one, plus an offset
//! argument after every array. They perform no dimension or bounds checking,
//! so they are `unsafe` and the caller owns the Fortran-side preconditions.
//! Character mode flags are `&str`; output scalars are `&mut` references.
//!
//! ```no_run
//! let blas = netlib_dyn::blas()?;
//! let x = [1.0, 1.0, 1.0];
//! let mut y = [1.0, 1.0, 1.0];
//! unsafe { blas.daxpy(3, 1.0, &x, 0, 1, &mut y, 0, 1) };
//! # Ok::<(), netlib_dyn::LoadError>(())
//! ```

mod config;
mod flags;
mod loader;

pub mod arpack;
pub mod blas;
pub mod eigs;
pub mod error;
pub mod lapack;

pub use arpack::{arpack, DynArpack};
pub use blas::{blas, DynBlas};
pub use eigs::{symmetric_eigs_f32, symmetric_eigs_f64, EigsError, Which};
pub use error::{CallError, CallResult, LoadError, LoadResult};
pub use lapack::{lapack, DynLapack};
