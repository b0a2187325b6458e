//! Matrices of $`\hat{J}_z`$, $`\hat{J}_+`$, $`\hat{J}_-`$ and dipole transition probabilities
//! in an eigenbasis of a $`j`$ multiplet.

use std::fmt;

use log;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::angmom::{AngmomError, AngularMomentum};

#[cfg(test)]
#[path = "joperators_tests.rs"]
mod joperators_tests;

// ==================
// Struct definitions
// ==================

/// A structure containing the angular-momentum operator matrices and the transition-probability
/// matrix of a $`j`$ multiplet in a given eigenbasis.
///
/// All matrices are indexed by eigenstates: element `[(a, b)]` is the matrix element
/// $`\braket{a | \hat{O} | b}`$ between eigenvectors `a` and `b` of the supplied basis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JOperators {
    /// The angular momentum of the multiplet.
    pub angmom: AngularMomentum,

    /// The matrix of $`\hat{J}_z`$. This is symmetric.
    pub jz: Array2<f64>,

    /// The matrix of the raising operator $`\hat{J}_+`$.
    pub jplus: Array2<f64>,

    /// The matrix of the lowering operator $`\hat{J}_-`$. Off the diagonal, this is the transpose
    /// of [`Self::jplus`]; on the diagonal, it coincides with [`Self::jplus`].
    pub jminus: Array2<f64>,

    /// The dipole transition-probability matrix
    ///
    /// ```math
    ///     P_{ab} = \frac{(2 J_{z,ab})^2 + J_{+,ab}^2 + J_{-,ab}^2}{3}, \quad a \ne b.
    /// ```
    ///
    /// This is symmetric, non-negative, and has a zero diagonal.
    pub transition_probability: Array2<f64>,
}

/// The upper-triangle elements of one row of the operator matrices, for columns `row..size`.
/// The diagonal of $`J_-`$ equals that of $`J_+`$, so `jminus` starts at column `row + 1`.
struct RowElements {
    row: usize,
    jz: Vec<f64>,
    jplus: Vec<f64>,
    jminus: Vec<f64>,
}

impl JOperators {
    /// Builds the operator matrices serially.
    ///
    /// # Arguments
    ///
    /// * `eigenfunctions` - A square matrix whose columns are the eigenvectors and whose rows
    /// are the magnetic sublevels $`m = -j, \ldots, j`$ in increasing order.
    /// * `angmom` - The angular momentum of the multiplet.
    ///
    /// # Errors
    ///
    /// [`AngmomError::InvalidArgument`] if the basis is not a finite square matrix of dimension
    /// $`2j+1`$.
    pub fn build(
        eigenfunctions: &Array2<f64>,
        angmom: AngularMomentum,
    ) -> Result<Self, AngmomError> {
        let ladder = validate(eigenfunctions, angmom)?;
        log::debug!(
            "Building angular-momentum operator matrices serially for {angmom} ({} sublevels).",
            angmom.size()
        );
        let mqns = angmom.mqns();
        let rows = (0..angmom.size())
            .map(|row| row_elements(eigenfunctions, &mqns, &ladder, row))
            .collect::<Vec<_>>();
        Ok(Self::assemble(angmom, rows))
    }

    /// Builds the operator matrices with rows distributed over the global `rayon` thread pool.
    /// The results are identical to those of [`Self::build`].
    ///
    /// # Errors
    ///
    /// As for [`Self::build`].
    pub fn build_par(
        eigenfunctions: &Array2<f64>,
        angmom: AngularMomentum,
    ) -> Result<Self, AngmomError> {
        let ladder = validate(eigenfunctions, angmom)?;
        log::debug!(
            "Building angular-momentum operator matrices in parallel for {angmom} ({} sublevels).",
            angmom.size()
        );
        let mqns = angmom.mqns();
        let rows = (0..angmom.size())
            .into_par_iter()
            .map(|row| row_elements(eigenfunctions, &mqns, &ladder, row))
            .collect::<Vec<_>>();
        Ok(Self::assemble(angmom, rows))
    }

    /// Builds the operator matrices serially from a real $`j`$.
    ///
    /// # Errors
    ///
    /// [`AngmomError::InvalidArgument`] if `j` is not a valid angular momentum or if the basis
    /// dimension differs from $`2j+1`$.
    pub fn from_j(eigenfunctions: &Array2<f64>, j: f64) -> Result<Self, AngmomError> {
        Self::build(eigenfunctions, AngularMomentum::from_j(j)?)
    }

    /// Builds the operator matrices serially from the triple $`(j, j(j+1), 2j+1)`$, which is
    /// checked for mutual consistency first.
    ///
    /// # Errors
    ///
    /// [`AngmomError::InvalidArgument`] if the triple is inconsistent or does not match the
    /// basis.
    pub fn from_parts(
        eigenfunctions: &Array2<f64>,
        j: f64,
        squared_j: f64,
        size: usize,
    ) -> Result<Self, AngmomError> {
        Self::build(
            eigenfunctions,
            AngularMomentum::from_parts(j, squared_j, size)?,
        )
    }

    /// Returns the dimension of the multiplet.
    pub fn size(&self) -> usize {
        self.angmom.size()
    }

    /// Returns the diagonal expectation value $`\braket{a | \hat{J}_x | a}`$ for eigenstate `a`,
    /// given by $`\tfrac{1}{2}(J_{+,aa} + J_{-,aa})`$.
    pub fn jx_expectation(&self, a: usize) -> f64 {
        0.5 * (self.jplus[(a, a)] + self.jminus[(a, a)])
    }

    /// Scatters per-row upper-triangle elements into freshly zeroed matrices, filling in the
    /// mirrored lower triangle.
    fn assemble(angmom: AngularMomentum, rows: Vec<RowElements>) -> Self {
        let size = angmom.size();
        let mut jz = Array2::<f64>::zeros((size, size));
        let mut jplus = Array2::<f64>::zeros((size, size));
        let mut jminus = Array2::<f64>::zeros((size, size));
        let mut transition_probability = Array2::<f64>::zeros((size, size));

        for elements in rows {
            let row = elements.row;
            jz[(row, row)] = elements.jz[0];
            jplus[(row, row)] = elements.jplus[0];
            jminus[(row, row)] = elements.jplus[0];
            for offset in 1..elements.jz.len() {
                let column = row + offset;
                let (z, p, m) = (
                    elements.jz[offset],
                    elements.jplus[offset],
                    elements.jminus[offset - 1],
                );
                let tp = ((2.0 * z).powi(2) + p.powi(2) + m.powi(2)) / 3.0;

                jz[(row, column)] = z;
                jplus[(row, column)] = p;
                jminus[(row, column)] = m;
                transition_probability[(row, column)] = tp;

                jz[(column, row)] = z;
                jplus[(column, row)] = m;
                jminus[(column, row)] = p;
                transition_probability[(column, row)] = tp;
            }
        }

        Self {
            angmom,
            jz,
            jplus,
            jminus,
            transition_probability,
        }
    }
}

impl fmt::Display for JOperators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, mat) in [
            ("J_z", &self.jz),
            ("J_+", &self.jplus),
            ("J_-", &self.jminus),
            ("Transition probability", &self.transition_probability),
        ] {
            writeln!(f, "{name}:")?;
            for row in mat.rows() {
                let line = row
                    .iter()
                    .map(|x| format!("{x:>+10.5}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "  {line}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// =========
// Functions
// =========

/// Checks the eigenbasis against the angular momentum and returns the ladder factors.
fn validate(
    eigenfunctions: &Array2<f64>,
    angmom: AngularMomentum,
) -> Result<Vec<f64>, AngmomError> {
    let (nrows, ncols) = eigenfunctions.dim();
    if nrows == 0 || ncols == 0 {
        return Err(AngmomError::InvalidArgument(
            "the eigenfunction basis is empty".to_string(),
        ));
    }
    if nrows != ncols {
        return Err(AngmomError::InvalidArgument(format!(
            "the eigenfunction basis must be square, but has shape {nrows} × {ncols}"
        )));
    }
    if nrows != angmom.size() {
        return Err(AngmomError::InvalidArgument(format!(
            "the eigenfunction basis has dimension {nrows}, but {angmom} requires {}",
            angmom.size()
        )));
    }
    if let Some(((k, r), x)) = eigenfunctions.indexed_iter().find(|(_, x)| !x.is_finite()) {
        return Err(AngmomError::InvalidArgument(format!(
            "the eigenfunction coefficient at ({k}, {r}) is not finite: {x}"
        )));
    }
    angmom.ladder_coefficients()
}

/// Computes the elements of row `row` of $`J_z`$ and $`J_+`$ for columns `row..size`, and of
/// $`J_-`$ for columns `row + 1..size`.
fn row_elements(
    eigenfunctions: &Array2<f64>,
    mqns: &[f64],
    ladder: &[f64],
    row: usize,
) -> RowElements {
    let size = mqns.len();
    let basis = eigenfunctions;
    let ncols = size - row;
    let mut jz = Vec::with_capacity(ncols);
    let mut jplus = Vec::with_capacity(ncols);
    let mut jminus = Vec::with_capacity(ncols - 1);
    for column in row..size {
        jz.push(
            mqns.iter()
                .enumerate()
                .map(|(k, m)| basis[(k, row)] * basis[(k, column)] * m)
                .sum::<f64>(),
        );
        jplus.push(
            ladder
                .iter()
                .enumerate()
                .map(|(k, l)| basis[(k + 1, row)] * basis[(k, column)] * l)
                .sum::<f64>(),
        );
        if column > row {
            jminus.push(
                ladder
                    .iter()
                    .enumerate()
                    .map(|(k, l)| basis[(k, row)] * basis[(k + 1, column)] * l)
                    .sum::<f64>(),
            );
        }
    }
    RowElements {
        row,
        jz,
        jplus,
        jminus,
    }
}
