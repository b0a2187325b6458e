//! Angular momentum quantum numbers and operator matrices in supplied eigenbases.

use std::error::Error;
use std::fmt;

use fraction::Fraction;
use serde::{Deserialize, Serialize};

pub mod joperators;


/// Absolute tolerance used when checking that real-valued quantum numbers are consistent with one
/// another.
const QN_TOLERANCE: f64 = 1e-10;

// ==================
// Error definitions
// ==================

/// An enumerated type for errors arising from angular-momentum operator construction.
#[derive(Debug, Clone, PartialEq)]
pub enum AngmomError {
    /// Variant for arguments that are mutually inconsistent or out of range. The associated
    /// string describes the offending argument.
    InvalidArgument(String),

    /// Variant for a negative radicand $`j(j+1) - m(m+1)`$ in a ladder-operator matrix element.
    NumericDomain {
        /// The value of $`j(j+1)`$ used.
        squared_j: f64,

        /// The magnetic quantum number $`m`$ at which the radicand became negative.
        m: f64,

        /// The offending radicand.
        radicand: f64,
    },
}

impl fmt::Display for AngmomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}."),
            Self::NumericDomain {
                squared_j,
                m,
                radicand,
            } => write!(
                f,
                "Numeric domain error: ladder radicand j(j+1) - m(m+1) = {radicand:.6e} is negative \
                 (j(j+1) = {squared_j}, m = {m})."
            ),
        }
    }
}

impl Error for AngmomError {}

// ==================
// Struct definitions
// ==================

/// A structure representing a total angular momentum quantum number $`j`$, which is either
/// integral or half-integral.
///
/// Internally, $`2j`$ is stored so that only physically meaningful values can be represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AngularMomentum {
    /// Two times the angular momentum, $`2j`$.
    twoj: u32,
}

impl AngularMomentum {
    /// Constructs an angular momentum from $`2j`$.
    pub fn from_twoj(twoj: u32) -> Self {
        Self { twoj }
    }

    /// Constructs an angular momentum from a real $`j`$.
    ///
    /// # Errors
    ///
    /// [`AngmomError::InvalidArgument`] if `j` is negative, non-finite, or not a multiple of
    /// $`\tfrac{1}{2}`$.
    pub fn from_j(j: f64) -> Result<Self, AngmomError> {
        if !j.is_finite() || j < 0.0 {
            return Err(AngmomError::InvalidArgument(format!(
                "`j` = {j} must be finite and non-negative"
            )));
        }
        let twoj_f = (2.0 * j).round();
        if (twoj_f - 2.0 * j).abs() > QN_TOLERANCE {
            return Err(AngmomError::InvalidArgument(format!(
                "`j` = {j} is neither integral nor half-integral"
            )));
        }
        if twoj_f > f64::from(u32::MAX) {
            return Err(AngmomError::InvalidArgument(format!("`j` = {j} is too large")));
        }
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let twoj = twoj_f as u32;
        Ok(Self { twoj })
    }

    /// Constructs the angular momentum whose multiplet has `size` $`= 2j + 1`$ sublevels.
    ///
    /// # Errors
    ///
    /// [`AngmomError::InvalidArgument`] if `size` is zero or too large.
    pub fn from_size(size: usize) -> Result<Self, AngmomError> {
        let twoj = size
            .checked_sub(1)
            .ok_or_else(|| AngmomError::InvalidArgument("`size` must be at least 1".to_string()))?;
        let twoj = u32::try_from(twoj).map_err(|_| {
            AngmomError::InvalidArgument(format!("`size` = {size} is too large"))
        })?;
        Ok(Self { twoj })
    }

    /// Constructs an angular momentum from the triple $`(j, j(j+1), 2j+1)`$, checking that all
    /// three are mutually consistent.
    ///
    /// # Arguments
    ///
    /// * `j` - The total angular momentum $`j`$.
    /// * `squared_j` - The precomputed value of $`j(j+1)`$.
    /// * `size` - The dimension $`2j+1`$ of the multiplet.
    ///
    /// # Errors
    ///
    /// [`AngmomError::InvalidArgument`] if any of the three values is invalid or if they are
    /// inconsistent with one another.
    pub fn from_parts(j: f64, squared_j: f64, size: usize) -> Result<Self, AngmomError> {
        let angmom = Self::from_j(j)?;
        if size != angmom.size() {
            return Err(AngmomError::InvalidArgument(format!(
                "`size` = {size} is inconsistent with `j` = {j} (expected {})",
                angmom.size()
            )));
        }
        if !squared_j.is_finite() || (squared_j - angmom.squared_j()).abs() > QN_TOLERANCE {
            return Err(AngmomError::InvalidArgument(format!(
                "`squared_j` = {squared_j} is inconsistent with `j` = {j} (expected {})",
                angmom.squared_j()
            )));
        }
        Ok(angmom)
    }

    /// Returns $`2j`$.
    pub fn twoj(&self) -> u32 {
        self.twoj
    }

    /// Returns $`j`$.
    pub fn j(&self) -> f64 {
        f64::from(self.twoj) / 2.0
    }

    /// Returns $`j(j+1)`$.
    pub fn squared_j(&self) -> f64 {
        let j = self.j();
        j * (j + 1.0)
    }

    /// Returns the number of magnetic sublevels, $`2j+1`$.
    pub fn size(&self) -> usize {
        self.twoj as usize + 1
    }

    /// Returns `true` if $`j`$ is half-integral.
    pub fn is_half_integral(&self) -> bool {
        self.twoj % 2 == 1
    }

    /// Returns the magnetic quantum number $`m_k = k - j`$ of the sublevel with index `k`, where
    /// sublevels are arranged in increasing order of $`m`$.
    pub fn mqn(&self, k: usize) -> f64 {
        k as f64 - self.j()
    }

    /// Returns all magnetic quantum numbers $`-j, \ldots, j`$ in increasing order.
    pub fn mqns(&self) -> Vec<f64> {
        (0..self.size()).map(|k| self.mqn(k)).collect()
    }

    /// Returns the ladder factor $`\sqrt{j(j+1) - m_k(m_k+1)}`$ connecting sublevels `k` and
    /// `k + 1`.
    ///
    /// # Errors
    ///
    /// [`AngmomError::NumericDomain`] if the radicand is negative.
    pub fn ladder_coefficient(&self, k: usize) -> Result<f64, AngmomError> {
        ladder_factor(self.squared_j(), self.mqn(k))
    }

    /// Returns the ladder factors for all adjacent sublevel pairs `(k, k + 1)` with
    /// `k = 0, ..., 2j - 1`.
    ///
    /// # Errors
    ///
    /// [`AngmomError::NumericDomain`] at the first negative radicand.
    pub fn ladder_coefficients(&self) -> Result<Vec<f64>, AngmomError> {
        (0..self.size().saturating_sub(1))
            .map(|k| self.ladder_coefficient(k))
            .collect()
    }
}

impl fmt::Display for AngularMomentum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "J = {}", Fraction::new(u64::from(self.twoj), 2u64))
    }
}

// =========
// Functions
// =========

/// Returns the ladder-operator factor
///
/// ```math
///     \sqrt{j(j+1) - m(m+1)},
/// ```
///
/// which is the magnitude of $`\braket{m+1 | \hat{J}_+ | m}`$ and of
/// $`\braket{m | \hat{J}_- | m+1}`$.
///
/// # Arguments
///
/// * `squared_j` - The value of $`j(j+1)`$.
/// * `m` - The magnetic quantum number of the lower sublevel.
///
/// # Errors
///
/// [`AngmomError::NumericDomain`] if the radicand is negative, which only happens when
/// `squared_j` and `m` do not belong to the same multiplet.
pub fn ladder_factor(squared_j: f64, m: f64) -> Result<f64, AngmomError> {
    let radicand = squared_j - m * (m + 1.0);
    if radicand.is_nan() || radicand < -QN_TOLERANCE {
        Err(AngmomError::NumericDomain {
            squared_j,
            m,
            radicand,
        })
    } else {
        Ok(radicand.max(0.0).sqrt())
    }
}
