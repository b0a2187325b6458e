//! Inelastic neutron-scattering peaks and broadened spectra from dipole transition
//! probabilities.

use std::fmt;

use anyhow::{self, ensure};
use itertools::Itertools;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

pub mod lineshape;

pub use lineshape::LineShape;


/// Default energy window in meV within which peaks are merged.
pub const DEFAULT_PEAK_RESOLUTION: f64 = 1e-2;

/// Default intensity below which merged peaks are discarded.
pub const DEFAULT_PEAK_THRESHOLD: f64 = 1e-4;

/// Default number of points of an automatically generated energy grid.
pub const DEFAULT_GRID_POINTS: usize = 501;

/// Prefactor converting summed transition intensities into a magnetic neutron-scattering cross
/// section in mb/sr, to be multiplied by $`g_J^2`$.
pub const CROSS_SECTION_PREFACTOR: f64 = 72.65;

/// A structure representing a single spectral peak.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// The transition energy $`E_f - E_i`$ in meV.
    pub energy: f64,

    /// The population-weighted transition probability.
    pub intensity: f64,
}

impl fmt::Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>+12.5} meV {:>12.6}", self.energy, self.intensity)
    }
}

/// Returns every transition with a strictly positive intensity.
///
/// For each ordered pair of an initial state $`i`$ and a final state $`f`$, the peak has energy
/// $`E_f - E_i`$ and intensity $`P_{fi} p_i`$, where $`p_i`$ is the thermal population of the
/// initial state.
///
/// # Arguments
///
/// * `transition_probability` - The transition-probability matrix.
/// * `eigenvalues` - The eigenvalues in meV.
/// * `populations` - The thermal populations of the eigenstates.
///
/// # Errors
///
/// Errors if the dimensions of the arguments disagree.
pub fn all_peaks(
    transition_probability: &Array2<f64>,
    eigenvalues: &Array1<f64>,
    populations: &Array1<f64>,
) -> Result<Vec<Peak>, anyhow::Error> {
    let n = eigenvalues.len();
    ensure!(
        transition_probability.dim() == (n, n),
        "Transition-probability matrix of shape {:?} does not match {n} eigenvalues.",
        transition_probability.dim()
    );
    ensure!(
        populations.len() == n,
        "{} populations do not match {n} eigenvalues.",
        populations.len()
    );
    let peaks = (0..n)
        .cartesian_product(0..n)
        .filter_map(|(initial, target)| {
            let intensity = transition_probability[(target, initial)] * populations[initial];
            (intensity > 0.0).then(|| Peak {
                energy: eigenvalues[target] - eigenvalues[initial],
                intensity,
            })
        })
        .collect_vec();
    Ok(peaks)
}

/// Merges peaks that cannot be resolved.
///
/// Peaks are visited in order. A visited peak that still carries intensity absorbs every other
/// peak whose energy lies strictly within `resolution` of its own: intensities are summed and the
/// energy becomes the intensity-weighted mean. Absorbed peaks are emptied. Merged peaks whose
/// intensity does not exceed `threshold` are dropped, and the survivors are sorted by energy.
pub fn merge_peaks(peaks: &[Peak], resolution: f64, threshold: f64) -> Vec<Peak> {
    let mut peaks = peaks.to_vec();
    let mut merged = Vec::with_capacity(peaks.len());
    for i in 0..peaks.len() {
        let centre = peaks[i].energy;
        let mut weighted_energy = centre * peaks[i].intensity;
        for j in 0..peaks.len() {
            if j != i
                && peaks[i].intensity > 0.0
                && (centre - peaks[j].energy).abs() < resolution
            {
                peaks[i].intensity += peaks[j].intensity;
                weighted_energy += peaks[j].energy * peaks[j].intensity;
                peaks[j].intensity = 0.0;
            }
        }
        if peaks[i].intensity > threshold {
            merged.push(Peak {
                energy: weighted_energy / peaks[i].intensity,
                intensity: peaks[i].intensity,
            });
        }
    }
    merged.sort_by(|a, b| a.energy.total_cmp(&b.energy));
    merged
}

/// Returns a uniform energy grid spanning $`\pm 1.1 (E_{\max} - E_{\min})`$.
///
/// # Errors
///
/// Errors if fewer than two points are requested, if there are no eigenvalues, or if all
/// eigenvalues coincide.
pub fn default_energy_grid(
    eigenvalues: &Array1<f64>,
    n_points: usize,
) -> Result<Array1<f64>, anyhow::Error> {
    ensure!(n_points >= 2, "An energy grid needs at least two points.");
    let energies = crate::thermal::relative_energies(eigenvalues)?;
    let emax = energies.fold(0.0f64, |acc, e| acc.max(*e));
    ensure!(
        emax > 0.0,
        "Cannot choose a default energy range: all eigenvalues are degenerate."
    );
    Ok(Array1::linspace(-1.1 * emax, 1.1 * emax, n_points))
}

/// Returns the default line shape for an energy grid: a Gaussian whose standard deviation is one
/// percent of the grid range.
pub fn default_lineshape(energies: &Array1<f64>) -> LineShape {
    let emin = energies.fold(f64::INFINITY, |acc, e| acc.min(*e));
    let emax = energies.fold(f64::NEG_INFINITY, |acc, e| acc.max(*e));
    LineShape::Gaussian {
        sigma: 0.01 * (emax - emin),
    }
}

/// Computes a broadened magnetic neutron-scattering spectrum
///
/// ```math
///     S(E) = 72.65\, g_J^2 \sum_p I_p\, f(E - E_p),
/// ```
///
/// where $`f`$ is the normalised line shape.
///
/// # Errors
///
/// Errors if the line shape is invalid.
pub fn spectrum(
    peaks: &[Peak],
    energies: &Array1<f64>,
    lineshape: &LineShape,
    lande_factor: f64,
) -> Result<Array1<f64>, anyhow::Error> {
    lineshape.validate()?;
    let scale = CROSS_SECTION_PREFACTOR * lande_factor.powi(2);
    Ok(energies.mapv(|e| {
        scale
            * peaks
                .iter()
                .map(|peak| peak.intensity * lineshape.evaluate(e, peak.energy))
                .sum::<f64>()
    }))
}
