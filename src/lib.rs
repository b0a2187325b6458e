//! # cefmat: angular-momentum operator matrices of $`J`$ multiplets
//!
//! `cefmat` takes the eigenbasis and eigenvalues of a single $`J`$ multiplet, typically the
//! ground multiplet of a rare-earth ion in a crystal electric field, and computes:
//! - the matrices of $`\hat{J}_z`$, $`\hat{J}_+`$ and $`\hat{J}_-`$ in that eigenbasis,
//! - the pairwise dipole transition-probability matrix,
//! - thermal populations and inelastic neutron-scattering peaks and spectra,
//! - thermally averaged magnetic moments, and
//! - the Curie and Van Vleck parts of the single-ion magnetic susceptibility.
//!
//! The eigenbasis is supplied as a real square matrix whose columns are eigenstates and whose
//! rows are the magnetic sublevels $`m = -j, \ldots, j`$, lowest first. Diagonalisation of a
//! crystal-field Hamiltonian is left to the caller.
//!
//! ## Examples and usage
//!
//! For most items (structs, enums, functions, and traits), their usages are illustrated in test
//! functions.
//!
//! The `cefmat` binary reads a YAML input file:
//!
//! ```text
//! cefmat --config input.yml [--output output.txt] [-v]
//! ```
//!
//! ## License
//!
//! GNU Lesser General Public License v3.0.

pub mod angmom;
pub mod auxiliary;
pub mod drivers;
pub mod interfaces;
pub mod io;
pub mod magnetism;
pub mod spectrum;
pub mod thermal;
