//! Input specification for `cefmat` read from a YAML file.

use std::fmt;

use anyhow::{self, bail, ensure, format_err};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::angmom::AngularMomentum;
use crate::auxiliary::rare_earth::RareEarthIon;
use crate::drivers::transition_analysis::{TransitionAnalysisDriver, TransitionAnalysisParams};
use crate::drivers::CefmatDriver;
use crate::interfaces::InputHandle;
use crate::io::format::{cefmat_error, cefmat_output, log_subtitle};


/// An enumerated type specifying the ion whose ground multiplet is analysed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum IonSpecification {
    /// Variant for a trivalent rare-earth ion given by its chemical symbol or its number of
    /// $`4f`$ electrons. The ground-multiplet $`J`$ and the Landé factor are taken from
    /// [`RareEarthIon`].
    RareEarth(String),

    /// Variant for an explicitly specified multiplet.
    Custom {
        /// The total angular momentum $`j`$, integral or half-integral.
        j: f64,

        /// The Landé factor $`g_J`$.
        lande_factor: f64,
    },
}

impl IonSpecification {
    /// Resolves the specification into an angular momentum and a Landé factor.
    ///
    /// # Errors
    ///
    /// Errors if the rare-earth symbol is unknown, or if `j` is not a non-negative integral or
    /// half-integral number.
    pub fn resolve(&self) -> Result<(AngularMomentum, f64), anyhow::Error> {
        match self {
            Self::RareEarth(symbol) => {
                let ion = RareEarthIon::from_identifier(symbol)
                    .ok_or_else(|| format_err!("Unknown rare-earth ion `{symbol}`."))?;
                Ok((ion.angmom(), ion.lande_factor_f64()))
            }
            Self::Custom { j, lande_factor } => {
                ensure!(
                    lande_factor.is_finite(),
                    "Invalid Landé factor: {lande_factor}."
                );
                Ok((AngularMomentum::from_j(*j)?, *lande_factor))
            }
        }
    }
}

impl fmt::Display for IonSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RareEarth(symbol) => match RareEarthIon::from_identifier(symbol) {
                Some(ion) => write!(f, "{ion}"),
                None => write!(f, "{symbol} (unknown)"),
            },
            Self::Custom { j, lande_factor } => {
                write!(f, "custom multiplet, j = {j}, g_J = {lande_factor}")
            }
        }
    }
}

/// A structure containing `cefmat` input parameters which can be serialised into and
/// deserialised from a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
    /// The ion whose ground multiplet is analysed.
    pub ion: IonSpecification,

    /// The eigenvalues in meV, one per eigenstate.
    pub eigenvalues: Vec<f64>,

    /// The eigenbasis written row by row: row $`k`$ holds the coefficients of the sublevel
    /// $`m = k - j`$ in every eigenstate, so that column $`r`$ is eigenstate $`r`$.
    pub eigenfunctions: Vec<Vec<f64>>,

    /// The control parameters for transition analysis.
    ///
    /// # Default
    ///
    /// If not specified, [`TransitionAnalysisParams::default`] is used.
    #[serde(default)]
    pub analysis: TransitionAnalysisParams,
}

impl Input {
    /// Returns the eigenvalues and the eigenbasis as arrays.
    ///
    /// # Errors
    ///
    /// Errors if the eigenbasis is not square or its dimension differs from the number of
    /// eigenvalues.
    pub fn arrays(&self) -> Result<(Array1<f64>, Array2<f64>), anyhow::Error> {
        let n = self.eigenvalues.len();
        ensure!(
            self.eigenfunctions.len() == n,
            "{} eigenfunction rows given for {n} eigenvalues.",
            self.eigenfunctions.len()
        );
        if let Some((k, row)) = self
            .eigenfunctions
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n)
        {
            bail!(
                "Eigenfunction row {k} has {} entries, but {n} are expected.",
                row.len()
            );
        }
        let eigenfunctions = Array2::from_shape_vec(
            (n, n),
            self.eigenfunctions.iter().flatten().copied().collect(),
        )
        .map_err(|err| format_err!(err))?;
        Ok((Array1::from_vec(self.eigenvalues.clone()), eigenfunctions))
    }
}

impl InputHandle for Input {
    fn handle(&self) -> Result<(), anyhow::Error> {
        log_subtitle("Ion");
        cefmat_output!("");
        cefmat_output!("{}", self.ion);
        cefmat_output!("");

        let (angmom, lande_factor) = self.ion.resolve()?;
        let (eigenvalues, eigenfunctions) = self.arrays()?;
        let mut driver = TransitionAnalysisDriver::builder()
            .parameters(&self.analysis)
            .angmom(angmom)
            .lande_factor(lande_factor)
            .eigenvalues(&eigenvalues)
            .eigenfunctions(&eigenfunctions)
            .build()
            .map_err(|err| format_err!(err))?;
        driver.run().map_err(|err| {
            cefmat_error!("Transition analysis failed: {err}");
            err
        })?;
        driver.result().map(|_| ())
    }
}
