pub mod domain;

pub use self::domain::TimeDomain;

use crate::{
    error::{Error, Result},
    real::Real,
    seed::{self, SeedSource, Stream},
    space::Sampleable,
};
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

type Indexed<O, V> = Arc<dyn Fn(&O, usize) -> V + Send + Sync>;
type Timed<O, V> = Arc<dyn Fn(&O, Real) -> V + Send + Sync>;

enum Rule<O, V> {
    Indexed(Indexed<O, V>),
    Timed(Timed<O, V>),
}

impl<O, V> Clone for Rule<O, V> {
    fn clone(&self) -> Self {
        match self {
            Rule::Indexed(f) => Rule::Indexed(Arc::clone(f)),
            Rule::Timed(f) => Rule::Timed(Arc::clone(f)),
        }
    }
}

/// A sample space, a time domain and an evaluation rule mapping
/// `(outcome, time)` to a value.
///
/// The space is shared: every process derived from this one reads the
/// same outcomes without re-sampling them.
pub struct RandomProcess<S: Sampleable, V> {
    space: Arc<S>,
    domain: TimeDomain,
    rule: Rule<S::Outcome, V>,
}

impl<S: Sampleable, V> Clone for RandomProcess<S, V> {
    fn clone(&self) -> Self {
        RandomProcess {
            space: Arc::clone(&self.space),
            domain: self.domain,
            rule: self.rule.clone(),
        }
    }
}

impl<S, V> RandomProcess<S, V>
where
    S: Sampleable,
    S::Outcome: 'static,
    V: 'static,
{
    /// Process observed at times `n / rate`; the rule receives `n`.
    pub fn discrete<F>(space: Arc<S>, rate: Real, rule: F) -> Result<Self>
    where
        F: Fn(&S::Outcome, usize) -> V + Send + Sync + 'static,
    {
        Ok(RandomProcess {
            space,
            domain: TimeDomain::discrete(rate)?,
            rule: Rule::Indexed(Arc::new(rule)),
        })
    }

    /// Discrete process with unit rate, so time `n` reads index `n`.
    pub fn sequence<F>(space: Arc<S>, rule: F) -> Self
    where
        F: Fn(&S::Outcome, usize) -> V + Send + Sync + 'static,
    {
        RandomProcess {
            space,
            domain: TimeDomain::Discrete { rate: 1.0 },
            rule: Rule::Indexed(Arc::new(rule)),
        }
    }

    pub fn continuous<F>(space: Arc<S>, rule: F) -> Self
    where
        F: Fn(&S::Outcome, Real) -> V + Send + Sync + 'static,
    {
        RandomProcess {
            space,
            domain: TimeDomain::Continuous,
            rule: Rule::Timed(Arc::new(rule)),
        }
    }

    pub fn space(&self) -> &Arc<S> {
        &self.space
    }

    pub fn domain(&self) -> TimeDomain {
        self.domain
    }

    /// Realizes one outcome from a single seed of `seeds`.
    pub fn draw<R: SeedSource + ?Sized>(&self, seeds: &mut R) -> S::Outcome {
        self.space.draw(&mut seed::stream(seeds))
    }

    /// Value of the realization `outcome` at time `t`.
    pub fn at(&self, outcome: &S::Outcome, t: Real) -> Result<V> {
        match &self.rule {
            Rule::Indexed(f) => {
                let n = self.domain.index_of(t)?;
                Ok(f(outcome, n))
            }
            Rule::Timed(f) => {
                self.domain.check(t)?;
                Ok(f(outcome, t))
            }
        }
    }

    /// Values of one realization at several times.
    pub fn path(&self, outcome: &S::Outcome, times: &[Real]) -> Result<Vec<V>> {
        times.iter().map(|&t| self.at(outcome, t)).collect()
    }

    /// Process reading the same outcomes, with values passed through `f`.
    pub fn map<W, F>(&self, f: F) -> RandomProcess<S, W>
    where
        W: 'static,
        F: Fn(V) -> W + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let rule = match &self.rule {
            Rule::Indexed(g) => {
                let g = Arc::clone(g);
                Rule::Indexed(Arc::new(move |o: &S::Outcome, n: usize| f(g(o, n))) as Indexed<_, _>)
            }
            Rule::Timed(g) => {
                let g = Arc::clone(g);
                Rule::Timed(Arc::new(move |o: &S::Outcome, t: Real| f(g(o, t))) as Timed<_, _>)
            }
        };
        RandomProcess {
            space: Arc::clone(&self.space),
            domain: self.domain,
            rule,
        }
    }

    /// Joint process of two processes over the same space and time domain.
    pub fn zip<W: 'static>(&self, other: &RandomProcess<S, W>) -> Result<RandomProcess<S, (V, W)>> {
        if !Arc::ptr_eq(&self.space, &other.space) {
            return Err(Error::invalid_parameter(
                "zipped processes must share one sample space",
            ));
        }
        if self.domain != other.domain {
            return Err(Error::invalid_parameter(format!(
                "zipped processes must share one time domain, got {:?} and {:?}",
                self.domain, other.domain
            )));
        }
        let rule = match (&self.rule, &other.rule) {
            (Rule::Indexed(f), Rule::Indexed(g)) => {
                let (f, g) = (Arc::clone(f), Arc::clone(g));
                Rule::Indexed(
                    Arc::new(move |o: &S::Outcome, n: usize| (f(o, n), g(o, n))) as Indexed<_, _>,
                )
            }
            (Rule::Timed(f), Rule::Timed(g)) => {
                let (f, g) = (Arc::clone(f), Arc::clone(g));
                Rule::Timed(
                    Arc::new(move |o: &S::Outcome, t: Real| (f(o, t), g(o, t))) as Timed<_, _>,
                )
            }
            _ => unreachable!("equal time domains imply matching rules"),
        };
        Ok(RandomProcess {
            space: Arc::clone(&self.space),
            domain: self.domain,
            rule,
        })
    }
}

/// Parallel simulation. One seed is pulled per draw, in order, so the
/// results match `n` sequential calls to [`RandomProcess::draw`].
impl<S, V> RandomProcess<S, V>
where
    S: Sampleable + Send + Sync,
    S::Outcome: Send + 'static,
    V: Send + 'static,
{
    pub fn sim<R: SeedSource + ?Sized>(&self, n: usize, seeds: &mut R) -> Vec<S::Outcome> {
        debug!(draws = n, "simulating realizations");
        let seeds: Vec<u64> = (0..n).map(|_| seeds.next_seed()).collect();
        seeds
            .into_par_iter()
            .map(|seed| self.space.draw(&mut Stream::seed_from_u64(seed)))
            .collect()
    }

    /// Values at time `t` of `n` fresh realizations.
    pub fn sim_at<R: SeedSource + ?Sized>(&self, n: usize, t: Real, seeds: &mut R) -> Result<Vec<V>> {
        self.domain.check(t)?;
        debug!(draws = n, time = t, "simulating values");
        let seeds: Vec<u64> = (0..n).map(|_| seeds.next_seed()).collect();
        seeds
            .into_par_iter()
            .map(|seed| {
                let outcome = self.space.draw(&mut Stream::seed_from_u64(seed));
                self.at(&outcome, t)
            })
            .collect()
    }
}


// -- end of file --
