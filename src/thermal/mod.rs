//! Thermal populations of eigenstates.

use anyhow::{self, ensure};
use ndarray::Array1;


/// The number of kelvins per millielectronvolt, *i.e.* $`1\ \mathrm{meV} / k_{\mathrm{B}}`$.
pub const KELVIN_PER_MEV: f64 = 11.6045;

/// Converts a temperature in kelvins to the thermal energy $`k_{\mathrm{B}}T`$ in meV.
pub fn kelvin_to_mev(temperature: f64) -> f64 {
    temperature / KELVIN_PER_MEV
}

/// Returns the eigenvalues shifted so that the lowest one is zero.
///
/// # Errors
///
/// Errors if `eigenvalues` is empty or contains non-finite values.
pub fn relative_energies(eigenvalues: &Array1<f64>) -> Result<Array1<f64>, anyhow::Error> {
    ensure!(!eigenvalues.is_empty(), "No eigenvalues supplied.");
    ensure!(
        eigenvalues.iter().all(|e| e.is_finite()),
        "Eigenvalues must all be finite."
    );
    let emin = eigenvalues.fold(f64::INFINITY, |acc, e| acc.min(*e));
    Ok(eigenvalues.mapv(|e| e - emin))
}

/// Returns the unnormalised Boltzmann weights $`\exp(-E_i / k_{\mathrm{B}}T)`$ with energies
/// measured from the ground level, together with the partition function.
///
/// # Arguments
///
/// * `eigenvalues` - The eigenvalues in meV.
/// * `temperature` - The temperature in kelvins, which must be strictly positive.
///
/// # Errors
///
/// Errors if the temperature is not strictly positive or if the eigenvalues are invalid.
pub fn boltzmann_weights(
    eigenvalues: &Array1<f64>,
    temperature: f64,
) -> Result<(Array1<f64>, f64), anyhow::Error> {
    ensure!(
        temperature.is_finite() && temperature > 0.0,
        "Boltzmann weights require a strictly positive temperature, but {temperature} K was given."
    );
    let kt = kelvin_to_mev(temperature);
    let weights = relative_energies(eigenvalues)?.mapv(|e| (-e / kt).exp());
    let z = weights.sum();
    Ok((weights, z))
}

/// Returns the partition function $`Z = \sum_i \exp(-E_i / k_{\mathrm{B}}T)`$ with energies
/// measured from the ground level.
///
/// # Errors
///
/// As for [`boltzmann_weights`].
pub fn partition_function(
    eigenvalues: &Array1<f64>,
    temperature: f64,
) -> Result<f64, anyhow::Error> {
    boltzmann_weights(eigenvalues, temperature).map(|(_, z)| z)
}

/// Returns the normalised thermal populations of the eigenstates.
///
/// At zero temperature, the population is shared equally by every level lying within
/// `degeneracy_threshold` of the ground level.
///
/// # Arguments
///
/// * `eigenvalues` - The eigenvalues in meV.
/// * `temperature` - The temperature in kelvins.
/// * `degeneracy_threshold` - The energy window in meV defining the ground level at zero
/// temperature.
///
/// # Errors
///
/// Errors if the temperature or the degeneracy threshold is negative or non-finite, or if the
/// eigenvalues are invalid.
pub fn boltzmann_populations(
    eigenvalues: &Array1<f64>,
    temperature: f64,
    degeneracy_threshold: f64,
) -> Result<Array1<f64>, anyhow::Error> {
    ensure!(
        temperature.is_finite() && temperature >= 0.0,
        "Temperature must be finite and non-negative, but {temperature} K was given."
    );
    ensure!(
        degeneracy_threshold.is_finite() && degeneracy_threshold >= 0.0,
        "Degeneracy threshold must be finite and non-negative, but {degeneracy_threshold} meV was given."
    );
    if temperature > 0.0 {
        let (weights, z) = boltzmann_weights(eigenvalues, temperature)?;
        Ok(weights / z)
    } else {
        let energies = relative_energies(eigenvalues)?;
        let ground = energies.mapv(|e| if e <= degeneracy_threshold { 1.0 } else { 0.0 });
        let degeneracy = ground.sum();
        ensure!(degeneracy > 0.0, "No ground level found at zero temperature.");
        log::debug!("Zero-temperature ground level is {degeneracy}-fold degenerate.");
        Ok(ground / degeneracy)
    }
}
