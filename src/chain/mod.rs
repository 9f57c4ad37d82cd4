//! Finite-state Markov chains in discrete and continuous time.

pub mod continuous;
pub mod discrete;

pub use self::continuous::{ContinuousTimeMarkovChain, JumpPath, JumpSpace};
pub use self::discrete::{ChainSpace, MarkovChain};

use crate::{
    error::{Error, Result},
    real::Real,
};

/// Row-major square matrix.
pub type Matrix = Vec<Vec<Real>>;

/// Slack on the total mass of a probability vector.
#[cfg(any(feature = "f32", not(feature = "f64")))]
pub const PROBABILITY_TOLERANCE: Real = 1.0e-5;
#[cfg(all(feature = "f64", not(feature = "f32")))]
pub const PROBABILITY_TOLERANCE: Real = 1.0e-9;

/// Slack on generator row sums, relative to the largest rate in the row.
#[cfg(any(feature = "f32", not(feature = "f64")))]
pub const GENERATOR_TOLERANCE: Real = 1.0e-5;
#[cfg(all(feature = "f64", not(feature = "f32")))]
pub const GENERATOR_TOLERANCE: Real = 1.0e-9;

fn check_distribution(what: &str, p: &[Real]) -> Result<()> {
    if let Some(x) = p.iter().find(|x| !(x.is_finite() && **x >= 0.0 && **x <= 1.0)) {
        return Err(Error::invalid_parameter(format!(
            "{} has an entry outside [0, 1]: {}",
            what, x
        )));
    }
    let total: Real = p.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(Error::invalid_parameter(format!(
            "{} must sum to 1, got {}",
            what, total
        )));
    }
    Ok(())
}

fn check_labels<L>(labels: &[L], num_states: usize) -> Result<()> {
    if labels.len() != num_states {
        return Err(Error::invalid_parameter(format!(
            "expected {} state labels, got {}",
            num_states,
            labels.len()
        )));
    }
    Ok(())
}


// -- end of file --
