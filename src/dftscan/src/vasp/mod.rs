//! VASP output scanners

pub mod eigenval;
pub mod outcar;

pub use eigenval::{Eigenval, KPoint};
