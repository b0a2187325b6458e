//! Driver for the analysis of dipole transitions and magnetic properties of a $`j`$ multiplet in
//! a supplied eigenbasis.

use std::fmt;

use anyhow::{self, ensure, format_err};
use approx;
use derive_builder::Builder;
use itertools::Itertools;
use log;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::angmom::joperators::JOperators;
use crate::angmom::AngularMomentum;
use crate::drivers::CefmatDriver;
use crate::io::format::{
    cefmat_output, cefmat_warn, log_subtitle, log_title, nice_bool, write_subtitle, CefmatOutput,
};
use crate::magnetism::{
    magnetic_moments, susceptibility, susceptibility_curve, MagneticMoments, Susceptibility,
};
use crate::spectrum::{
    all_peaks, default_energy_grid, default_lineshape, merge_peaks, spectrum, LineShape, Peak,
    DEFAULT_GRID_POINTS, DEFAULT_PEAK_RESOLUTION, DEFAULT_PEAK_THRESHOLD,
};
use crate::thermal::{boltzmann_populations, relative_energies};


/// Largest element-wise deviation of $`\mathbf{B}^{\mathsf{T}}\mathbf{B}`$ from the identity
/// tolerated without a warning.
const ORTHONORMALITY_TOLERANCE: f64 = 1e-6;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

fn default_true() -> bool {
    true
}
fn default_peak_resolution() -> f64 {
    DEFAULT_PEAK_RESOLUTION
}
fn default_peak_threshold() -> f64 {
    DEFAULT_PEAK_THRESHOLD
}
fn default_degeneracy_threshold() -> f64 {
    1e-8
}
fn default_grid_points() -> usize {
    DEFAULT_GRID_POINTS
}

/// A structure containing control parameters for a broadened spectrum.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectrumParams {
    /// The line shape used to broaden each peak. If `None`, a Gaussian whose standard deviation
    /// is one percent of the energy range is used.
    #[builder(default = "None")]
    #[serde(default)]
    pub lineshape: Option<LineShape>,

    /// The lower and upper bounds of the energy grid in meV. If `None`, the grid spans
    /// $`\pm 1.1`$ times the largest excitation energy.
    #[builder(default = "None")]
    #[serde(default)]
    pub energy_range: Option<(f64, f64)>,

    /// The number of points of the energy grid.
    #[builder(default = "DEFAULT_GRID_POINTS")]
    #[serde(default = "default_grid_points")]
    pub n_points: usize,
}

impl SpectrumParams {
    /// Returns a builder to construct a [`SpectrumParams`] structure.
    pub fn builder() -> SpectrumParamsBuilder {
        SpectrumParamsBuilder::default()
    }
}

impl Default for SpectrumParams {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("Unable to construct a default `SpectrumParams`.")
    }
}

/// A structure containing control parameters for transition analysis.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionAnalysisParams {
    /// The temperature in kelvins at which populations, peaks, moments and the susceptibility are
    /// evaluated. At zero temperature, the ground level is populated equally and no
    /// susceptibility is computed.
    #[builder(default = "0.0")]
    #[serde(default)]
    pub temperature: f64,

    /// The energy window in meV within which peaks are merged.
    #[builder(default = "DEFAULT_PEAK_RESOLUTION")]
    #[serde(default = "default_peak_resolution")]
    pub peak_resolution: f64,

    /// The intensity below which merged peaks are discarded.
    #[builder(default = "DEFAULT_PEAK_THRESHOLD")]
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: f64,

    /// The energy window in meV defining the degenerate ground level at zero temperature.
    #[builder(default = "1e-8")]
    #[serde(default = "default_degeneracy_threshold")]
    pub degeneracy_threshold: f64,

    /// Boolean indicating if the operator matrices are built in parallel.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Parameters for a broadened spectrum. If `None`, no spectrum is computed.
    #[builder(default = "None")]
    #[serde(default)]
    pub spectrum: Option<SpectrumParams>,

    /// Temperatures in kelvins at which the susceptibility is additionally evaluated. If `None`,
    /// no susceptibility curve is computed.
    #[builder(default = "None")]
    #[serde(default)]
    pub susceptibility_temperatures: Option<Vec<f64>>,

    /// Boolean indicating if the operator matrices are written to the output.
    #[builder(default = "false")]
    #[serde(default)]
    pub write_operator_matrices: bool,
}

impl TransitionAnalysisParams {
    /// Returns a builder to construct a [`TransitionAnalysisParams`] structure.
    pub fn builder() -> TransitionAnalysisParamsBuilder {
        TransitionAnalysisParamsBuilder::default()
    }
}

impl Default for TransitionAnalysisParams {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("Unable to construct a default `TransitionAnalysisParams`.")
    }
}

impl fmt::Display for TransitionAnalysisParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Temperature: {:.3} K", self.temperature)?;
        writeln!(f, "Peak merging resolution: {:.3e} meV", self.peak_resolution)?;
        writeln!(f, "Peak intensity threshold: {:.3e}", self.peak_threshold)?;
        writeln!(
            f,
            "Ground-level degeneracy threshold: {:.3e} meV",
            self.degeneracy_threshold
        )?;
        writeln!(f, "Parallel operator build: {}", nice_bool(self.parallel))?;
        writeln!(f)?;

        if let Some(spectrum_params) = self.spectrum.as_ref() {
            writeln!(f, "Broadened spectrum: {}", nice_bool(true))?;
            writeln!(
                f,
                "  Line shape: {}",
                spectrum_params
                    .lineshape
                    .map(|lineshape| lineshape.to_string())
                    .unwrap_or_else(|| "default".to_string())
            )?;
            writeln!(
                f,
                "  Energy range: {}",
                spectrum_params
                    .energy_range
                    .map(|(lo, hi)| format!("[{lo:+.3}, {hi:+.3}] meV"))
                    .unwrap_or_else(|| "default".to_string())
            )?;
            writeln!(f, "  Grid points: {}", spectrum_params.n_points)?;
        } else {
            writeln!(f, "Broadened spectrum: {}", nice_bool(false))?;
        }
        writeln!(
            f,
            "Susceptibility curve: {}",
            self.susceptibility_temperatures
                .as_ref()
                .map(|temperatures| format!("{} temperatures", temperatures.len()))
                .unwrap_or_else(|| nice_bool(false))
        )?;
        writeln!(
            f,
            "Write operator matrices: {}",
            nice_bool(self.write_operator_matrices)
        )?;
        writeln!(f)?;

        Ok(())
    }
}

// ------
// Result
// ------

/// A structure containing a spectrum broadened on an energy grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BroadenedSpectrum {
    /// The line shape used for broadening.
    pub lineshape: LineShape,

    /// The energy grid in meV.
    pub energies: Array1<f64>,

    /// The cross section in mb/sr at each grid energy.
    pub intensities: Array1<f64>,
}

/// A structure to contain transition analysis results.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct TransitionAnalysisResult {
    /// The control parameters used to obtain this set of results.
    pub parameters: TransitionAnalysisParams,

    /// The Landé factor used.
    pub lande_factor: f64,

    /// The eigenvalues in meV.
    pub eigenvalues: Array1<f64>,

    /// The operator matrices in the eigenbasis.
    pub operators: JOperators,

    /// The thermal populations of the eigenstates.
    pub populations: Array1<f64>,

    /// The merged spectral peaks.
    pub peaks: Vec<Peak>,

    /// The thermally averaged angular momenta and magnetic moments.
    pub moments: MagneticMoments,

    /// The susceptibility at [`TransitionAnalysisParams::temperature`], if that temperature is
    /// strictly positive.
    #[builder(default = "None")]
    pub susceptibility: Option<Susceptibility>,

    /// The susceptibility at each of [`TransitionAnalysisParams::susceptibility_temperatures`].
    #[builder(default = "None")]
    pub susceptibility_curve: Option<Vec<Susceptibility>>,

    /// The broadened spectrum, if requested.
    #[builder(default = "None")]
    pub spectrum: Option<BroadenedSpectrum>,
}

impl TransitionAnalysisResult {
    /// Returns a builder to construct a [`TransitionAnalysisResult`] structure.
    fn builder() -> TransitionAnalysisResultBuilder {
        TransitionAnalysisResultBuilder::default()
    }

    /// Writes the eigenstate energies and populations in a nicely formatted table.
    fn write_eigenstates(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Eigenstates")?;
        writeln!(f)?;
        let ground = self.eigenvalues.fold(f64::INFINITY, |acc, e| acc.min(*e));
        writeln!(
            f,
            "{:>6} {:>14} {:>14} {:>12}",
            "State", "E (meV)", "E - E0 (meV)", "Population"
        )?;
        for (i, (e, p)) in self
            .eigenvalues
            .iter()
            .zip(self.populations.iter())
            .enumerate()
        {
            writeln!(f, "{i:>6} {e:>+14.5} {:>14.5} {p:>12.6}", e - ground)?;
        }
        writeln!(f)
    }

    /// Writes the susceptibility table.
    fn write_susceptibilities(
        f: &mut fmt::Formatter<'_>,
        susceptibilities: &[Susceptibility],
    ) -> fmt::Result {
        writeln!(
            f,
            "{:>10} {:>13} {:>13} {:>13} {:>13} {:>13} {:>13}",
            "T (K)", "Curie z", "Curie x", "Van Vleck z", "Van Vleck x", "Powder", "1/Powder"
        )?;
        for chi in susceptibilities {
            writeln!(
                f,
                "{:>10.3} {:>+13.5e} {:>+13.5e} {:>+13.5e} {:>+13.5e} {:>+13.5e} {:>+13.5e}",
                chi.temperature,
                chi.curie.z,
                chi.curie.x,
                chi.van_vleck.z,
                chi.van_vleck.x,
                chi.powder(),
                chi.inverse_powder()
            )?;
        }
        writeln!(f)
    }
}

impl fmt::Display for TransitionAnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_eigenstates(f)?;

        write_subtitle(f, "Peaks")?;
        writeln!(f)?;
        if self.peaks.is_empty() {
            writeln!(f, "No peaks above the intensity threshold.")?;
        } else {
            writeln!(f, "{:>16} {:>12}", "Energy", "Intensity")?;
            for peak in self.peaks.iter() {
                writeln!(f, "{peak}")?;
            }
        }
        writeln!(f)?;

        write_subtitle(f, "Magnetic moments")?;
        writeln!(f)?;
        write!(f, "{}", self.moments)?;
        writeln!(f)?;

        if let Some(chi) = self.susceptibility.as_ref() {
            write_subtitle(f, "Susceptibility (mu_B^2/meV)")?;
            writeln!(f)?;
            writeln!(f, "Total: {}", chi.total())?;
            Self::write_susceptibilities(f, &[*chi])?;
        }

        if let Some(curve) = self.susceptibility_curve.as_ref() {
            write_subtitle(f, "Susceptibility curve (mu_B^2/meV)")?;
            writeln!(f)?;
            Self::write_susceptibilities(f, curve)?;
        }

        if let Some(broadened) = self.spectrum.as_ref() {
            write_subtitle(f, "Broadened spectrum (mb/sr)")?;
            writeln!(f)?;
            writeln!(f, "Line shape: {}", broadened.lineshape)?;
            let (maximum_energy, maximum) = broadened
                .energies
                .iter()
                .zip(broadened.intensities.iter())
                .fold((f64::NAN, f64::NEG_INFINITY), |acc, (e, s)| {
                    if *s > acc.1 {
                        (*e, *s)
                    } else {
                        acc
                    }
                });
            writeln!(
                f,
                "{} points; maximum {maximum:.5e} at {maximum_energy:+.4} meV",
                broadened.energies.len()
            )?;
            writeln!(f)?;
        }

        if self.parameters.write_operator_matrices {
            write_subtitle(f, "Operator matrices")?;
            writeln!(f)?;
            write!(f, "{}", self.operators)?;
        }

        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver for transition analysis of a $`j`$ multiplet.
///
/// The driver builds the operator matrices in the supplied eigenbasis, evaluates thermal
/// populations, merged spectral peaks and magnetic moments at the requested temperature, and
/// optionally the susceptibility and a broadened spectrum.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct TransitionAnalysisDriver<'a> {
    /// The control parameters for transition analysis.
    parameters: &'a TransitionAnalysisParams,

    /// The angular momentum of the multiplet.
    angmom: AngularMomentum,

    /// The Landé factor $`g_J`$.
    lande_factor: f64,

    /// The eigenvalues in meV.
    eigenvalues: &'a Array1<f64>,

    /// The eigenbasis, with eigenvectors as columns and magnetic sublevels
    /// $`m = -j, \ldots, j`$ as rows.
    eigenfunctions: &'a Array2<f64>,

    /// The result of the transition analysis.
    #[builder(setter(skip), default = "None")]
    result: Option<TransitionAnalysisResult>,
}

impl<'a> TransitionAnalysisDriverBuilder<'a> {
    fn validate(&self) -> Result<(), String> {
        let angmom = self
            .angmom
            .ok_or("No angular momentum found.".to_string())?;
        let eigenvalues = self.eigenvalues.ok_or("No eigenvalues found.".to_string())?;
        let eigenfunctions = self
            .eigenfunctions
            .ok_or("No eigenfunctions found.".to_string())?;
        let size = angmom.size();
        if eigenvalues.len() != size {
            Err(format!(
                "{} eigenvalues do not match the multiplet {angmom} of dimension {size}.",
                eigenvalues.len()
            ))
        } else if eigenfunctions.dim() != (size, size) {
            Err(format!(
                "Eigenfunction matrix of shape {:?} does not match the multiplet {angmom} of dimension {size}.",
                eigenfunctions.dim()
            ))
        } else {
            Ok(())
        }
    }
}

impl<'a> TransitionAnalysisDriver<'a> {
    /// Returns a builder to construct a [`TransitionAnalysisDriver`] structure.
    pub fn builder() -> TransitionAnalysisDriverBuilder<'a> {
        TransitionAnalysisDriverBuilder::default()
    }

    /// Logs a warning if the eigenfunctions are not orthonormal.
    fn check_orthonormality(&self) {
        let overlap = self.eigenfunctions.t().dot(self.eigenfunctions);
        let orthonormal = overlap.indexed_iter().all(|((i, j), s)| {
            approx::abs_diff_eq!(
                *s,
                if i == j { 1.0 } else { 0.0 },
                epsilon = ORTHONORMALITY_TOLERANCE
            )
        });
        if !orthonormal {
            cefmat_warn!(
                "The eigenfunctions are not orthonormal to within {ORTHONORMALITY_TOLERANCE:.1e}. Results may be unphysical."
            );
        }
    }

    /// Computes the broadened spectrum requested by `spectrum_params`.
    fn broaden(
        &self,
        spectrum_params: &SpectrumParams,
        peaks: &[Peak],
    ) -> Result<BroadenedSpectrum, anyhow::Error> {
        let energies = if let Some((lo, hi)) = spectrum_params.energy_range {
            ensure!(
                lo < hi && spectrum_params.n_points >= 2,
                "Invalid energy grid: [{lo}, {hi}] meV with {} points.",
                spectrum_params.n_points
            );
            Array1::linspace(lo, hi, spectrum_params.n_points)
        } else {
            default_energy_grid(self.eigenvalues, spectrum_params.n_points)?
        };
        let lineshape = spectrum_params
            .lineshape
            .unwrap_or_else(|| default_lineshape(&energies));
        let intensities = spectrum(peaks, &energies, &lineshape, self.lande_factor)?;
        Ok(BroadenedSpectrum {
            lineshape,
            energies,
            intensities,
        })
    }

    /// Executes transition analysis.
    fn analyse_transitions(&mut self) -> Result<(), anyhow::Error> {
        log_title("Transition Analysis");
        cefmat_output!("");
        let params = self.parameters;
        ensure!(
            params.peak_resolution.is_finite() && params.peak_resolution >= 0.0,
            "Peak resolution must be finite and non-negative, but {} meV was given.",
            params.peak_resolution
        );
        ensure!(
            params.peak_threshold.is_finite() && params.peak_threshold >= 0.0,
            "Peak threshold must be finite and non-negative, but {} was given.",
            params.peak_threshold
        );
        params.log_output_display();

        cefmat_output!("Multiplet: {}, g_J = {:.6}", self.angmom, self.lande_factor);
        cefmat_output!("");

        let energies = relative_energies(self.eigenvalues)?;
        if energies.iter().tuple_windows().any(|(a, b)| b < a) {
            cefmat_warn!("The eigenvalues are not in ascending order.");
        }
        self.check_orthonormality();

        let operators = if params.parallel {
            JOperators::build_par(self.eigenfunctions, self.angmom)?
        } else {
            JOperators::build(self.eigenfunctions, self.angmom)?
        };

        let populations = boltzmann_populations(
            self.eigenvalues,
            params.temperature,
            params.degeneracy_threshold,
        )?;
        let raw_peaks = all_peaks(
            &operators.transition_probability,
            self.eigenvalues,
            &populations,
        )?;
        let peaks = merge_peaks(&raw_peaks, params.peak_resolution, params.peak_threshold);
        log::debug!(
            "{} transitions merged into {} peaks.",
            raw_peaks.len(),
            peaks.len()
        );

        let moments = magnetic_moments(&operators, &populations, self.lande_factor)?;

        let chi = if params.temperature > 0.0 {
            Some(susceptibility(
                &operators,
                self.eigenvalues,
                params.temperature,
                self.lande_factor,
            )?)
        } else {
            log::debug!("Susceptibility skipped at zero temperature.");
            None
        };

        let chi_curve = params
            .susceptibility_temperatures
            .as_ref()
            .map(|temperatures| {
                susceptibility_curve(
                    &operators,
                    self.eigenvalues,
                    temperatures,
                    self.lande_factor,
                )
            })
            .transpose()?;

        let broadened = params
            .spectrum
            .as_ref()
            .map(|spectrum_params| self.broaden(spectrum_params, &peaks))
            .transpose()?;

        let result = TransitionAnalysisResult::builder()
            .parameters(params.clone())
            .lande_factor(self.lande_factor)
            .eigenvalues(self.eigenvalues.clone())
            .operators(operators)
            .populations(populations)
            .peaks(peaks)
            .moments(moments)
            .susceptibility(chi)
            .susceptibility_curve(chi_curve)
            .spectrum(broadened)
            .build()
            .map_err(|err| format_err!(err))?;

        log_subtitle("Transition analysis results");
        cefmat_output!("");
        result.log_output_display();
        self.result = Some(result);

        Ok(())
    }
}

impl<'a> CefmatDriver for TransitionAnalysisDriver<'a> {
    type Params = TransitionAnalysisParams;

    type Outcome = TransitionAnalysisResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No transition analysis results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.analyse_transitions()
    }
}
