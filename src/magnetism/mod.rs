//! Magnetic moments and single-ion magnetic susceptibility from angular-momentum operator
//! matrices.

use std::fmt;

use anyhow::{self, ensure};
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::angmom::joperators::JOperators;
use crate::thermal::{boltzmann_weights, kelvin_to_mev, relative_energies};

#[cfg(test)]
#[path = "magnetism_tests.rs"]
mod magnetism_tests;

/// Fraction of $`k_{\mathrm{B}}T`$ below which two levels are treated as degenerate in the
/// susceptibility.
pub const SUSCEPTIBILITY_DEGENERACY_FRACTION: f64 = 1e-5;

// ==================
// Struct definitions
// ==================

/// A pair of values along the quantisation axis $`z`$ and a perpendicular axis $`x`$.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxialPair {
    /// The component along $`z`$.
    pub z: f64,

    /// The component along $`x`$.
    pub x: f64,
}

impl AxialPair {
    /// Scales both components.
    fn scaled(self, factor: f64) -> Self {
        Self {
            z: self.z * factor,
            x: self.x * factor,
        }
    }
}

impl fmt::Display for AxialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z: {:>+12.6e}, x: {:>+12.6e}", self.z, self.x)
    }
}

/// A structure containing thermally averaged angular momenta and magnetic moments.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MagneticMoments {
    /// The thermal averages $`\langle J_z \rangle`$ and $`\langle J_x \rangle`$.
    pub j_average: AxialPair,

    /// The magnetic moments $`g_J \langle J \rangle`$ in Bohr magnetons.
    pub moment: AxialPair,
}

impl fmt::Display for MagneticMoments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "<J_z> = {:>+9.4}; <mu_z> = {:>+9.4} mu_B",
            self.j_average.z, self.moment.z
        )?;
        writeln!(
            f,
            "<J_x> = {:>+9.4}; <mu_x> = {:>+9.4} mu_B",
            self.j_average.x, self.moment.x
        )
    }
}

/// A structure containing the Curie and Van Vleck contributions to the single-ion magnetic
/// susceptibility at one temperature, in units of $`\mu_{\mathrm{B}}^2/\mathrm{meV}`$.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Susceptibility {
    /// The temperature in kelvins.
    pub temperature: f64,

    /// The Curie contribution from matrix elements within degenerate levels.
    pub curie: AxialPair,

    /// The Van Vleck contribution from matrix elements between non-degenerate levels.
    pub van_vleck: AxialPair,
}

impl Susceptibility {
    /// Returns the total susceptibility along each axis.
    pub fn total(&self) -> AxialPair {
        AxialPair {
            z: self.curie.z + self.van_vleck.z,
            x: self.curie.x + self.van_vleck.x,
        }
    }

    /// Returns the powder-averaged susceptibility $`(\chi_z + 2\chi_x)/3`$.
    pub fn powder(&self) -> f64 {
        let total = self.total();
        (total.z + 2.0 * total.x) / 3.0
    }

    /// Returns the inverse of the powder-averaged susceptibility.
    pub fn inverse_powder(&self) -> f64 {
        1.0 / self.powder()
    }
}

// =========
// Functions
// =========

/// Returns the thermally averaged $`\langle J_z \rangle`$ and $`\langle J_x \rangle`$ and the
/// corresponding magnetic moments.
///
/// # Arguments
///
/// * `ops` - The operator matrices in the eigenbasis.
/// * `populations` - The normalised thermal populations of the eigenstates.
/// * `lande_factor` - The Landé factor $`g_J`$.
///
/// # Errors
///
/// Errors if the number of populations differs from the multiplet dimension.
pub fn magnetic_moments(
    ops: &JOperators,
    populations: &Array1<f64>,
    lande_factor: f64,
) -> Result<MagneticMoments, anyhow::Error> {
    ensure!(
        populations.len() == ops.size(),
        "{} populations do not match a multiplet of dimension {}.",
        populations.len(),
        ops.size()
    );
    let j_average = populations
        .iter()
        .enumerate()
        .fold(AxialPair::default(), |acc, (i, p)| AxialPair {
            z: acc.z + ops.jz[(i, i)] * p,
            x: acc.x + ops.jx_expectation(i) * p,
        });
    Ok(MagneticMoments {
        j_average,
        moment: j_average.scaled(lande_factor),
    })
}

/// Returns the Curie and Van Vleck contributions to the susceptibility at `temperature`.
///
/// # Arguments
///
/// * `ops` - The operator matrices in the eigenbasis.
/// * `eigenvalues` - The eigenvalues in meV.
/// * `temperature` - The temperature in kelvins, which must be strictly positive.
/// * `lande_factor` - The Landé factor $`g_J`$.
///
/// # Errors
///
/// Errors if the temperature is not strictly positive or if the dimensions disagree.
pub fn susceptibility(
    ops: &JOperators,
    eigenvalues: &Array1<f64>,
    temperature: f64,
    lande_factor: f64,
) -> Result<Susceptibility, anyhow::Error> {
    let size = ops.size();
    ensure!(
        eigenvalues.len() == size,
        "{} eigenvalues do not match a multiplet of dimension {size}.",
        eigenvalues.len()
    );
    let (weights, z) = boltzmann_weights(eigenvalues, temperature)?;
    let energies = relative_energies(eigenvalues)?;
    let kt = kelvin_to_mev(temperature);

    let mut curie = AxialPair::default();
    let mut van_vleck = AxialPair::default();
    for row in 0..size {
        for column in 0..size {
            let jz2 = ops.jz[(row, column)].powi(2);
            let jpm2 = ops.jplus[(row, column)].powi(2) + ops.jminus[(row, column)].powi(2);
            let gap = energies[column] - energies[row];
            if gap.abs() < SUSCEPTIBILITY_DEGENERACY_FRACTION * kt {
                curie.z += jz2 * weights[row];
                curie.x += 0.25 * jpm2 * weights[row];
            } else {
                van_vleck.z += 2.0 * jz2 * weights[row] / gap;
                van_vleck.x += 0.5 * jpm2 * weights[row] / gap;
            }
        }
    }

    let coefficient = lande_factor.powi(2) / z;
    Ok(Susceptibility {
        temperature,
        curie: curie.scaled(coefficient / kt),
        van_vleck: van_vleck.scaled(coefficient),
    })
}

/// Evaluates [`susceptibility`] at every temperature in `temperatures`, in parallel, keeping the
/// input order.
///
/// # Errors
///
/// Errors at the first invalid temperature.
pub fn susceptibility_curve(
    ops: &JOperators,
    eigenvalues: &Array1<f64>,
    temperatures: &[f64],
    lande_factor: f64,
) -> Result<Vec<Susceptibility>, anyhow::Error> {
    log::debug!(
        "Evaluating the susceptibility at {} temperatures.",
        temperatures.len()
    );
    temperatures
        .par_iter()
        .map(|&t| susceptibility(ops, eigenvalues, t, lande_factor))
        .collect()
}
