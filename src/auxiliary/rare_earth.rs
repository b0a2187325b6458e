//! Ground-multiplet data of trivalent rare-earth ions.

use std::fmt;

use fraction::Fraction;
use phf::phf_map;

use crate::angmom::AngularMomentum;

#[cfg(test)]
#[path = "rare_earth_tests.rs"]
mod rare_earth_tests;

/// A structure containing the Hund's-rules ground multiplet of a trivalent rare-earth ion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RareEarthIon {
    /// The chemical symbol of the element.
    pub symbol: &'static str,

    /// The number of $`4f`$ electrons of the trivalent ion.
    pub n_f_electrons: u32,

    /// Two times the total angular momentum of the ground multiplet.
    twoj: u32,

    /// The Landé $`g_J`$ factor as a (numerator, denominator) pair.
    lande: (u64, u64),
}

/// Trivalent rare-earth ions from Ce³⁺ to Yb³⁺, in order of increasing $`4f`$ occupancy.
pub static RARE_EARTH_IONS: [RareEarthIon; 13] = [
    RareEarthIon::new("Ce", 1, 5, (6, 7)),
    RareEarthIon::new("Pr", 2, 8, (4, 5)),
    RareEarthIon::new("Nd", 3, 9, (8, 11)),
    RareEarthIon::new("Pm", 4, 8, (3, 5)),
    RareEarthIon::new("Sm", 5, 5, (2, 7)),
    RareEarthIon::new("Eu", 6, 0, (0, 1)),
    RareEarthIon::new("Gd", 7, 7, (2, 1)),
    RareEarthIon::new("Tb", 8, 12, (3, 2)),
    RareEarthIon::new("Dy", 9, 15, (4, 3)),
    RareEarthIon::new("Ho", 10, 16, (5, 4)),
    RareEarthIon::new("Er", 11, 15, (6, 5)),
    RareEarthIon::new("Tm", 12, 12, (7, 6)),
    RareEarthIon::new("Yb", 13, 7, (8, 7)),
];

/// Indices into [`RARE_EARTH_IONS`] keyed by chemical symbol.
static RARE_EARTH_INDICES: phf::Map<&'static str, usize> = phf_map! {
    "Ce" => 0,
    "Pr" => 1,
    "Nd" => 2,
    "Pm" => 3,
    "Sm" => 4,
    "Eu" => 5,
    "Gd" => 6,
    "Tb" => 7,
    "Dy" => 8,
    "Ho" => 9,
    "Er" => 10,
    "Tm" => 11,
    "Yb" => 12,
};

impl RareEarthIon {
    const fn new(symbol: &'static str, n_f_electrons: u32, twoj: u32, lande: (u64, u64)) -> Self {
        Self {
            symbol,
            n_f_electrons,
            twoj,
            lande,
        }
    }

    /// Looks up a trivalent rare-earth ion by its chemical symbol (*e.g.* `"Dy"`). The lookup is
    /// case-insensitive, and a trailing charge such as `"Dy3+"` is accepted.
    pub fn from_symbol(symbol: &str) -> Option<&'static Self> {
        let symbol = symbol.trim().trim_end_matches("3+");
        let mut chars = symbol.chars();
        let normalised = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect::<String>(),
            None => return None,
        };
        RARE_EARTH_INDICES
            .get(normalised.as_str())
            .and_then(|&i| RARE_EARTH_IONS.get(i))
    }

    /// Looks up a trivalent rare-earth ion by the number of $`4f`$ electrons, from 1 (Ce³⁺) to
    /// 13 (Yb³⁺).
    pub fn from_n_f_electrons(n_f_electrons: u32) -> Option<&'static Self> {
        let index = usize::try_from(n_f_electrons).ok()?.checked_sub(1)?;
        RARE_EARTH_IONS.get(index)
    }

    /// Looks up a trivalent rare-earth ion either by its chemical symbol or by its number of
    /// $`4f`$ electrons written as an integer (*e.g.* `"9"` for Dy³⁺).
    pub fn from_identifier(identifier: &str) -> Option<&'static Self> {
        match identifier.trim().parse::<u32>() {
            Ok(n_f_electrons) => Self::from_n_f_electrons(n_f_electrons),
            Err(_) => Self::from_symbol(identifier),
        }
    }

    /// Returns the total angular momentum of the ground multiplet.
    pub fn angmom(&self) -> AngularMomentum {
        AngularMomentum::from_twoj(self.twoj)
    }

    /// Returns the exact Landé $`g_J`$ factor.
    pub fn lande_factor(&self) -> Fraction {
        Fraction::new(self.lande.0, self.lande.1)
    }

    /// Returns the Landé $`g_J`$ factor as a floating-point number.
    pub fn lande_factor_f64(&self) -> f64 {
        self.lande.0 as f64 / self.lande.1 as f64
    }
}

impl fmt::Display for RareEarthIon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}³⁺ (4f{}), {}, g_J = {}",
            self.symbol,
            self.n_f_electrons,
            self.angmom(),
            self.lande_factor()
        )
    }
}
