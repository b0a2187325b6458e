//! Normalised line shapes for peak broadening.

use std::f64::consts::{LN_2, PI};
use std::fmt;

use anyhow::{self, ensure};
use serde::{Deserialize, Serialize};

/// An enumerated type for line shapes. Every line shape integrates to unity over the real line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LineShape {
    /// A Gaussian with standard deviation `sigma`. Its full width at half maximum is
    /// $`2\sqrt{2 \ln 2}\,\sigma`$.
    Gaussian { sigma: f64 },

    /// A Lorentzian with half width at half maximum `gamma`.
    Lorentzian { gamma: f64 },

    /// A pseudo-Voigt mixture of a Gaussian of standard deviation `sigma` and a Lorentzian of
    /// half width `gamma`, with the mixing parameter of Thompson, Cox & Hastings,
    /// *J. Appl. Cryst.* **20**, 79–83 (1987).
    PseudoVoigt { sigma: f64, gamma: f64 },
}

impl LineShape {
    /// Checks that all widths are finite and strictly positive.
    ///
    /// # Errors
    ///
    /// Errors if any width is invalid.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let widths = match self {
            Self::Gaussian { sigma } => vec![*sigma],
            Self::Lorentzian { gamma } => vec![*gamma],
            Self::PseudoVoigt { sigma, gamma } => vec![*sigma, *gamma],
        };
        ensure!(
            widths.iter().all(|w| w.is_finite() && *w > 0.0),
            "Line-shape widths must be finite and strictly positive: {self}."
        );
        Ok(())
    }

    /// Evaluates the line shape centred at `centre` at `x`.
    pub fn evaluate(&self, x: f64, centre: f64) -> f64 {
        match self {
            Self::Gaussian { sigma } => gaussian(x, centre, *sigma),
            Self::Lorentzian { gamma } => lorentzian(x, centre, *gamma),
            Self::PseudoVoigt { sigma, gamma } => {
                let eta = pseudo_voigt_eta(*sigma, *gamma);
                (1.0 - eta) * gaussian(x, centre, *sigma) + eta * lorentzian(x, centre, *gamma)
            }
        }
    }
}

impl fmt::Display for LineShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gaussian { sigma } => write!(f, "Gaussian (σ = {sigma:.4e} meV)"),
            Self::Lorentzian { gamma } => write!(f, "Lorentzian (γ = {gamma:.4e} meV)"),
            Self::PseudoVoigt { sigma, gamma } => write!(
                f,
                "pseudo-Voigt (σ = {sigma:.4e} meV, γ = {gamma:.4e} meV)"
            ),
        }
    }
}

fn gaussian(x: f64, centre: f64, sigma: f64) -> f64 {
    (-(x - centre).powi(2) / (2.0 * sigma.powi(2))).exp() / (sigma * (2.0 * PI).sqrt())
}

fn lorentzian(x: f64, centre: f64, gamma: f64) -> f64 {
    (gamma / PI) / ((x - centre).powi(2) + gamma.powi(2))
}

/// Returns the Lorentzian fraction $`\eta`$ of a pseudo-Voigt profile.
fn pseudo_voigt_eta(sigma: f64, gamma: f64) -> f64 {
    let fg = 2.0 * sigma * (2.0 * LN_2).sqrt();
    let fl = 2.0 * gamma;
    let f_total = (fg.powi(5)
        + 2.69269 * fg.powi(4) * fl
        + 2.42843 * fg.powi(3) * fl.powi(2)
        + 4.47163 * fg.powi(2) * fl.powi(3)
        + 0.07842 * fg * fl.powi(4)
        + fl.powi(5))
    .powf(0.2);
    let ratio = fl / f_total;
    1.36603 * ratio - 0.47719 * ratio.powi(2) + 0.11116 * ratio.powi(3)
}
