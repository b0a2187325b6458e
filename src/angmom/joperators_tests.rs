use approx;
use ndarray::{array, Array2};
use proptest::prelude::*;

use crate::angmom::joperators::JOperators;
use crate::angmom::{AngmomError, AngularMomentum};

/// Returns an orthogonal matrix built from a product of Givens rotations acting on adjacent
/// index pairs.
fn givens_basis(size: usize, angles: &[f64]) -> Array2<f64> {
    let mut u = Array2::<f64>::eye(size);
    if size < 2 {
        return u;
    }
    for (i, theta) in angles.iter().enumerate() {
        let p = i % (size - 1);
        let q = p + 1;
        let mut g = Array2::<f64>::eye(size);
        g[(p, p)] = theta.cos();
        g[(q, q)] = theta.cos();
        g[(p, q)] = -theta.sin();
        g[(q, p)] = theta.sin();
        u = u.dot(&g);
    }
    u
}

/// Returns the operator matrices in the bare $`\ket{jm}`$ basis.
fn bare_operators(angmom: AngularMomentum) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
    let size = angmom.size();
    let jz0 = Array2::from_diag(&ndarray::Array1::from(angmom.mqns()));
    let mut jminus0 = Array2::<f64>::zeros((size, size));
    for (k, l) in angmom.ladder_coefficients().unwrap().iter().enumerate() {
        jminus0[(k, k + 1)] = *l;
    }
    let jplus0 = jminus0.t().to_owned();
    (jz0, jplus0, jminus0)
}

fn assert_mat_eq(a: &Array2<f64>, b: &Array2<f64>, thresh: f64) {
    assert_eq!(a.dim(), b.dim());
    approx::assert_abs_diff_eq!(
        (a - b).map(|x| x * x).sum().sqrt(),
        0.0,
        epsilon = thresh
    );
}

#[test]
fn test_joperators_size_one() {
    let basis = array![[1.0]];
    let ops = JOperators::from_j(&basis, 0.0).unwrap();
    assert_eq!(ops.size(), 1);
    assert_eq!(ops.jz, array![[0.0]]);
    assert_eq!(ops.jplus, array![[0.0]]);
    assert_eq!(ops.jminus, array![[0.0]]);
    assert_eq!(ops.transition_probability, array![[0.0]]);
}

#[test]
fn test_joperators_half_identity() {
    let basis = Array2::<f64>::eye(2);
    let ops = JOperators::from_j(&basis, 0.5).unwrap();
    assert_eq!(ops.jz, array![[-0.5, 0.0], [0.0, 0.5]]);
    approx::assert_relative_eq!(ops.jminus[(0, 1)], 1.0);
    approx::assert_relative_eq!(ops.jplus[(1, 0)], 1.0);
    assert_eq!(ops.jplus[(0, 1)], 0.0);
    assert_eq!(ops.jminus[(1, 0)], 0.0);
    assert_eq!(ops.jplus[(0, 0)], 0.0);
    assert_eq!(ops.jminus[(1, 1)], 0.0);
    approx::assert_relative_eq!(ops.transition_probability[(0, 1)], 1.0 / 3.0);
    approx::assert_relative_eq!(ops.transition_probability[(1, 0)], 1.0 / 3.0);
    assert_eq!(ops.transition_probability[(0, 0)], 0.0);
}

#[test]
fn test_joperators_identity_reduces_to_bare_operators() {
    for twoj in 0..8 {
        let angmom = AngularMomentum::from_twoj(twoj);
        let basis = Array2::<f64>::eye(angmom.size());
        let ops = JOperators::build(&basis, angmom).unwrap();
        let (jz0, jplus0, jminus0) = bare_operators(angmom);
        assert_mat_eq(&ops.jz, &jz0, 1e-14);
        assert_mat_eq(&ops.jplus, &jplus0, 1e-14);
        assert_mat_eq(&ops.jminus, &jminus0, 1e-14);
        for (r, m) in angmom.mqns().iter().enumerate() {
            approx::assert_relative_eq!(ops.jz[(r, r)], *m);
        }
    }
}

#[test]
fn test_joperators_reversed_basis() {
    // Eigenvectors ordered from m = j down to m = -j.
    let basis = array![[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
    let ops = JOperators::from_j(&basis, 1.0).unwrap();
    assert_mat_eq(
        &ops.jz,
        &array![[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, -1.0]],
        1e-14,
    );
    // |1> is reached from |0> by J+.
    approx::assert_relative_eq!(ops.jplus[(0, 1)], 2.0f64.sqrt());
    approx::assert_relative_eq!(ops.jminus[(1, 0)], 2.0f64.sqrt());
    approx::assert_relative_eq!(ops.transition_probability[(0, 1)], 2.0 / 3.0);
    assert_eq!(ops.transition_probability[(0, 2)], 0.0);
}

#[test]
fn test_joperators_rotated_half() {
    let theta = 0.3f64;
    let (c, s) = (theta.cos(), theta.sin());
    let basis = array![[c, -s], [s, c]];
    let ops = JOperators::from_j(&basis, 0.5).unwrap();
    approx::assert_relative_eq!(ops.jz[(0, 0)], -0.5 * (2.0 * theta).cos(), epsilon = 1e-14);
    approx::assert_relative_eq!(ops.jz[(1, 1)], 0.5 * (2.0 * theta).cos(), epsilon = 1e-14);
    approx::assert_relative_eq!(ops.jz[(0, 1)], c * s, epsilon = 1e-14);
    approx::assert_relative_eq!(ops.jplus[(0, 0)], s * c, epsilon = 1e-14);
    approx::assert_relative_eq!(ops.jminus[(0, 0)], s * c, epsilon = 1e-14);
    approx::assert_relative_eq!(ops.jplus[(0, 1)], -s * s, epsilon = 1e-14);
    approx::assert_relative_eq!(ops.jminus[(0, 1)], c * c, epsilon = 1e-14);
}

#[test]
fn test_joperators_orthogonal_similarity() {
    let angles = [0.1, -0.7, 1.3, 0.45, 2.2, -1.1, 0.05, 0.9, -0.3, 1.7, 0.6];
    for twoj in 1..9 {
        let angmom = AngularMomentum::from_twoj(twoj);
        let u = givens_basis(angmom.size(), &angles);
        let ops = JOperators::build(&u, angmom).unwrap();
        let (jz0, jplus0, jminus0) = bare_operators(angmom);

        assert_mat_eq(&ops.jz, &u.t().dot(&jz0).dot(&u), 1e-12);
        assert_mat_eq(&ops.jplus, &u.t().dot(&jplus0).dot(&u), 1e-12);
        assert_mat_eq(&ops.jminus, &u.t().dot(&jminus0).dot(&u), 1e-12);

        // Trace of J_z is invariant under orthogonal transformations.
        approx::assert_abs_diff_eq!(ops.jz.diag().sum(), 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_joperators_jminus_off_diagonal() {
    // A general non-orthogonal basis: off the diagonal J_- is B^T J_-^0 B, while its diagonal
    // repeats that of J_+.
    let basis = array![
        [0.3, -1.2, 0.5, 0.0],
        [0.8, 0.4, -0.7, 1.1],
        [-0.2, 0.9, 0.6, -0.4],
        [1.0, 0.1, -0.3, 0.7],
    ];
    let angmom = AngularMomentum::from_twoj(3);
    let (_, jplus0, jminus0) = bare_operators(angmom);
    let expected_jplus = basis.t().dot(&jplus0).dot(&basis);
    let expected_jminus = basis.t().dot(&jminus0).dot(&basis);
    for ops in [
        JOperators::build(&basis, angmom).unwrap(),
        JOperators::build_par(&basis, angmom).unwrap(),
    ] {
        for a in 0..4 {
            assert_eq!(ops.jminus[(a, a)], ops.jplus[(a, a)]);
            approx::assert_relative_eq!(
                ops.jplus[(a, a)],
                expected_jplus[(a, a)],
                epsilon = 1e-12
            );
            for b in (0..4).filter(|&b| b != a) {
                approx::assert_relative_eq!(
                    ops.jminus[(a, b)],
                    expected_jminus[(a, b)],
                    epsilon = 1e-12
                );
            }
        }
    }
}

#[test]
fn test_joperators_transition_sum_rule() {
    // For an orthonormal basis, summing (4 Jz² + J+² + J-²) / 3 over all final states b gives
    // (2 j(j+1) + 2 <a|Jz²|a>) / 3.
    let angles = [0.2, 1.1, -0.4, 0.8, -1.6, 0.35, 1.9];
    for twoj in 1..8 {
        let angmom = AngularMomentum::from_twoj(twoj);
        let size = angmom.size();
        let u = givens_basis(size, &angles);
        let ops = JOperators::build(&u, angmom).unwrap();
        let mqns = angmom.mqns();
        for a in 0..size {
            let offdiag = ops.transition_probability.row(a).sum();
            let diag = ((2.0 * ops.jz[(a, a)]).powi(2)
                + ops.jplus[(a, a)].powi(2)
                + ops.jminus[(a, a)].powi(2))
                / 3.0;
            let jz2 = (0..size)
                .map(|k| mqns[k] * mqns[k] * u[(k, a)] * u[(k, a)])
                .sum::<f64>();
            approx::assert_relative_eq!(
                offdiag + diag,
                (2.0 * angmom.squared_j() + 2.0 * jz2) / 3.0,
                epsilon = 1e-12,
                max_relative = 1e-12
            );
        }
    }
}

#[test]
fn test_joperators_par_matches_serial() {
    let angles = [0.3, -0.2, 1.4, 0.7, -0.9, 2.1, 0.15];
    let angmom = AngularMomentum::from_j(7.5).unwrap();
    let u = givens_basis(angmom.size(), &angles);
    let ser = JOperators::build(&u, angmom).unwrap();
    let par = JOperators::build_par(&u, angmom).unwrap();
    assert_eq!(ser.jz, par.jz);
    assert_eq!(ser.jplus, par.jplus);
    assert_eq!(ser.jminus, par.jminus);
    assert_eq!(ser.transition_probability, par.transition_probability);
}

#[test]
fn test_joperators_invalid_arguments() {
    // j = 1 requires a 3 × 3 basis.
    let basis = Array2::<f64>::eye(2);
    assert!(matches!(
        JOperators::from_j(&basis, 1.0),
        Err(AngmomError::InvalidArgument(_))
    ));

    let non_square = Array2::<f64>::zeros((2, 3));
    assert!(matches!(
        JOperators::from_j(&non_square, 0.5),
        Err(AngmomError::InvalidArgument(_))
    ));

    let empty = Array2::<f64>::zeros((0, 0));
    assert!(matches!(
        JOperators::build(&empty, AngularMomentum::from_twoj(0)),
        Err(AngmomError::InvalidArgument(_))
    ));

    let mut nan = Array2::<f64>::eye(2);
    nan[(1, 0)] = f64::NAN;
    assert!(matches!(
        JOperators::from_j(&nan, 0.5),
        Err(AngmomError::InvalidArgument(_))
    ));

    assert!(matches!(
        JOperators::from_j(&Array2::<f64>::eye(2), 0.7),
        Err(AngmomError::InvalidArgument(_))
    ));

    // The full quantum-number triple must be self-consistent.
    let basis = Array2::<f64>::eye(3);
    assert!(JOperators::from_parts(&basis, 1.0, 2.0, 3).is_ok());
    assert!(matches!(
        JOperators::from_parts(&basis, 1.0, 2.5, 3),
        Err(AngmomError::InvalidArgument(_))
    ));
    assert!(matches!(
        JOperators::from_parts(&basis, 1.0, 2.0, 4),
        Err(AngmomError::InvalidArgument(_))
    ));
}

#[test]
fn test_joperators_jx_expectation() {
    let theta = std::f64::consts::FRAC_PI_4;
    let (c, s) = (theta.cos(), theta.sin());
    let basis = array![[c, -s], [s, c]];
    let ops = JOperators::from_j(&basis, 0.5).unwrap();
    // (|-1/2> + |1/2>) / sqrt(2) is the +x eigenstate of J_x.
    approx::assert_relative_eq!(ops.jx_expectation(0), 0.5, epsilon = 1e-14);
    approx::assert_relative_eq!(ops.jx_expectation(1), -0.5, epsilon = 1e-14);
}

fn arb_basis() -> impl Strategy<Value = Array2<f64>> {
    (1usize..=7).prop_flat_map(|size| {
        prop::collection::vec(-1.0f64..1.0, size * size).prop_map(move |v| {
            Array2::from_shape_vec((size, size), v).expect("Unable to shape the random basis.")
        })
    })
}

proptest! {
    #[test]
    fn test_joperators_structural_invariants(basis in arb_basis()) {
        let angmom = AngularMomentum::from_size(basis.nrows()).unwrap();
        let ops = JOperators::build(&basis, angmom).unwrap();
        let size = ops.size();
        for a in 0..size {
            prop_assert_eq!(ops.jminus[(a, a)], ops.jplus[(a, a)]);
            prop_assert_eq!(ops.transition_probability[(a, a)], 0.0);
            for b in 0..size {
                prop_assert_eq!(ops.jz[(a, b)], ops.jz[(b, a)]);
                prop_assert_eq!(
                    ops.transition_probability[(a, b)],
                    ops.transition_probability[(b, a)]
                );
                prop_assert_eq!(ops.jplus[(a, b)], ops.jminus[(b, a)]);
                prop_assert!(ops.transition_probability[(a, b)] >= 0.0);
            }
        }

        // Trace of J_z weights each m_k by the squared norm of basis row k.
        let mqns = angmom.mqns();
        let expected_trace = (0..size)
            .map(|k| mqns[k] * basis.row(k).map(|x| x * x).sum())
            .sum::<f64>();
        prop_assert!((ops.jz.diag().sum() - expected_trace).abs() < 1e-10);
    }
}
