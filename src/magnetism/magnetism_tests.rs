use approx;
use ndarray::{array, Array1, Array2};

use crate::angmom::joperators::JOperators;
use crate::angmom::AngularMomentum;
use crate::magnetism::{magnetic_moments, susceptibility, susceptibility_curve};
use crate::thermal::{boltzmann_populations, kelvin_to_mev, KELVIN_PER_MEV};

#[test]
fn test_magnetism_moments_ground_state() {
    let ops = JOperators::from_j(&Array2::<f64>::eye(2), 0.5).unwrap();
    let populations = boltzmann_populations(&array![0.0, 1.0], 0.0, 1e-8).unwrap();
    let moments = magnetic_moments(&ops, &populations, 2.0).unwrap();
    approx::assert_relative_eq!(moments.j_average.z, -0.5);
    approx::assert_relative_eq!(moments.moment.z, -1.0);
    assert_eq!(moments.j_average.x, 0.0);

    // Equal superposition of both sublevels points along +x.
    let (c, s) = (
        std::f64::consts::FRAC_PI_4.cos(),
        std::f64::consts::FRAC_PI_4.sin(),
    );
    let ops = JOperators::from_j(&array![[c, -s], [s, c]], 0.5).unwrap();
    let moments = magnetic_moments(&ops, &populations, 2.0).unwrap();
    approx::assert_abs_diff_eq!(moments.j_average.z, 0.0, epsilon = 1e-14);
    approx::assert_relative_eq!(moments.j_average.x, 0.5, epsilon = 1e-14);
    approx::assert_relative_eq!(moments.moment.x, 1.0, epsilon = 1e-14);

    assert!(magnetic_moments(&ops, &array![1.0], 2.0).is_err());
}

#[test]
fn test_magnetism_moments_high_temperature() {
    // Equal populations average <J_z> to zero.
    let ops = JOperators::from_j(&Array2::<f64>::eye(4), 1.5).unwrap();
    let populations = Array1::from_elem(4, 0.25);
    let moments = magnetic_moments(&ops, &populations, 0.8).unwrap();
    approx::assert_abs_diff_eq!(moments.j_average.z, 0.0, epsilon = 1e-14);
}

#[test]
fn test_magnetism_free_ion_curie_law() {
    // A free ion has a fully degenerate multiplet and follows the Curie law
    // chi = g² j(j+1) / (3 k_B T) along every axis.
    for twoj in 1..8 {
        let angmom = AngularMomentum::from_twoj(twoj);
        let ops = JOperators::build(&Array2::<f64>::eye(angmom.size()), angmom).unwrap();
        let eigenvalues = Array1::zeros(angmom.size());
        let lande = 1.25;
        let temperature = 10.0;
        let chi = susceptibility(&ops, &eigenvalues, temperature, lande).unwrap();
        let expected = lande.powi(2) * angmom.squared_j() / (3.0 * kelvin_to_mev(temperature));
        approx::assert_relative_eq!(chi.curie.z, expected, epsilon = 1e-12);
        approx::assert_relative_eq!(chi.curie.x, expected, epsilon = 1e-12);
        assert_eq!(chi.van_vleck.z, 0.0);
        assert_eq!(chi.van_vleck.x, 0.0);
        approx::assert_relative_eq!(chi.powder(), expected, epsilon = 1e-12);
        approx::assert_relative_eq!(chi.inverse_powder(), 1.0 / expected, epsilon = 1e-10);
    }
}

#[test]
fn test_magnetism_two_level_van_vleck() {
    let ops = JOperators::from_j(&Array2::<f64>::eye(2), 0.5).unwrap();
    let gap = 2.0;
    let eigenvalues = array![0.0, gap];
    let temperature = KELVIN_PER_MEV;
    let lande = 2.0;
    let chi = susceptibility(&ops, &eigenvalues, temperature, lande).unwrap();

    approx::assert_relative_eq!(chi.curie.z, lande.powi(2) / 4.0, epsilon = 1e-12);
    assert_eq!(chi.curie.x, 0.0);
    assert_eq!(chi.van_vleck.z, 0.0);
    approx::assert_relative_eq!(
        chi.van_vleck.x,
        lande.powi(2) / (2.0 * gap) * (gap / 2.0).tanh(),
        epsilon = 1e-12
    );
}

#[test]
fn test_magnetism_susceptibility_curve() {
    let ops = JOperators::from_j(&Array2::<f64>::eye(3), 1.0).unwrap();
    let eigenvalues = array![0.0, 0.0, 5.0];
    let temperatures = [1.0, 10.0, 100.0, 300.0];
    let curve = susceptibility_curve(&ops, &eigenvalues, &temperatures, 1.0).unwrap();
    assert_eq!(curve.len(), temperatures.len());
    for (chi, t) in curve.iter().zip(temperatures.iter()) {
        assert_eq!(chi.temperature, *t);
        assert_eq!(*chi, susceptibility(&ops, &eigenvalues, *t, 1.0).unwrap());
    }
    // The Curie part decreases with temperature.
    assert!(curve[0].curie.z > curve[3].curie.z);

    assert!(susceptibility_curve(&ops, &eigenvalues, &[10.0, 0.0], 1.0).is_err());
    assert!(susceptibility(&ops, &array![0.0, 1.0], 10.0, 1.0).is_err());
}
