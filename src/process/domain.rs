use crate::{
    error::{Error, Result},
    real::Real,
};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Relative slack allowed when matching a time to a discrete grid point.
pub const ALIGNMENT_TOLERANCE: Real = 1.0e3 * Real::EPSILON;

/// Index set of a random process.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum TimeDomain {
    /// Times `n / rate` for `n = 0, 1, 2, ...`.
    Discrete { rate: Real },
    /// All non-negative reals.
    Continuous,
}

impl TimeDomain {
    pub fn discrete(rate: Real) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(Error::invalid_parameter(format!(
                "sampling rate must be positive and finite, got {}",
                rate
            )));
        }
        Ok(TimeDomain::Discrete { rate })
    }

    pub fn continuous() -> Self {
        TimeDomain::Continuous
    }

    pub fn rate(&self) -> Option<Real> {
        match *self {
            TimeDomain::Discrete { rate } => Some(rate),
            TimeDomain::Continuous => None,
        }
    }

    pub fn is_discrete(&self) -> bool {
        self.rate().is_some()
    }

    /// Rejects negative or non-finite times, and off-grid times in discrete domains.
    pub fn check(&self, t: Real) -> Result<()> {
        match *self {
            TimeDomain::Discrete { .. } => self.index_of(t).map(|_| ()),
            TimeDomain::Continuous => check_time(t),
        }
    }

    /// Grid index of `t` in a discrete domain.
    pub fn index_of(&self, t: Real) -> Result<usize> {
        check_time(t)?;
        let rate = self
            .rate()
            .ok_or_else(|| Error::domain("continuous time domain has no index"))?;
        let x = t * rate;
        let n = x.round();
        if (x - n).abs() > ALIGNMENT_TOLERANCE * n.max(1.0) {
            return Err(Error::domain(format!(
                "time {} is not a multiple of 1/{}",
                t, rate
            )));
        }
        if n >= usize::MAX as Real {
            return Err(Error::domain(format!(
                "time {} is past the last index of the grid",
                t
            )));
        }
        Ok(n as usize)
    }
}

fn check_time(t: Real) -> Result<()> {
    if !t.is_finite() || t < 0.0 {
        return Err(Error::domain(format!(
            "time must be finite and non-negative, got {}",
            t
        )));
    }
    Ok(())
}


// -- end of file --
