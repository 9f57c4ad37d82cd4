pub mod lazy;

pub use self::lazy::LazySequence;

use crate::{
    error::{Error, Result},
    real::Real,
    seed::{self, SeedSource, Stream},
};
use rand::distributions::{Bernoulli, Distribution};
use rand_distr::{Exp, Normal};
use std::{marker::PhantomData, sync::Arc};

/// Anything that realizes one outcome per draw.
pub trait Sampleable {
    type Outcome;

    fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> Self::Outcome;

    /// Joint space drawing `self` then `other`, each from its own seed.
    fn pair<B: Sampleable>(self, other: B) -> Pair<Self, B>
    where
        Self: Sized,
    {
        Pair(self, other)
    }

    /// Countably many independent copies of `self`.
    fn repeat(self) -> Repeat<Self>
    where
        Self: Sized,
    {
        Repeat(Arc::new(self))
    }
}

impl<A: Sampleable + ?Sized> Sampleable for Arc<A> {
    type Outcome = A::Outcome;

    fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> Self::Outcome {
        (**self).draw(seeds)
    }
}

/// Sample space over an outcome generator.
pub struct SampleSpace<F> {
    generator: F,
}

impl<T, F> SampleSpace<F>
where
    F: Fn(&mut Stream) -> T,
{
    pub fn new(generator: F) -> Self {
        SampleSpace { generator }
    }
}

impl<T, F> Sampleable for SampleSpace<F>
where
    F: Fn(&mut Stream) -> T,
{
    type Outcome = T;

    fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> T {
        (self.generator)(&mut seed::stream(seeds))
    }
}

/// Sample space over a `rand` distribution.
pub struct Dist<D, T> {
    dist: D,
    _outcome: PhantomData<fn() -> T>,
}

impl<D: Distribution<T>, T> Dist<D, T> {
    pub fn new(dist: D) -> Self {
        Dist {
            dist,
            _outcome: PhantomData,
        }
    }
}

impl<D: Distribution<T>, T> Sampleable for Dist<D, T> {
    type Outcome = T;

    fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> T {
        self.dist.sample(&mut seed::stream(seeds))
    }
}

/// Product space; outcomes keep the order of the components.
pub struct Pair<A, B>(pub A, pub B);

impl<A: Sampleable, B: Sampleable> Sampleable for Pair<A, B> {
    type Outcome = (A::Outcome, B::Outcome);

    fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> Self::Outcome {
        let a = self.0.draw(seeds);
        let b = self.1.draw(seeds);
        (a, b)
    }
}

/// Infinite product of one space with itself.
///
/// A draw consumes a single seed and yields a [`LazySequence`] whose
/// `n`-th entry is a base draw taken at the position the sequence stream
/// reached after the first `n` entries.
pub struct Repeat<A>(Arc<A>);

impl<A> Sampleable for Repeat<A>
where
    A: Sampleable + Send + Sync + 'static,
    A::Outcome: Clone,
{
    type Outcome = LazySequence<A::Outcome>;

    fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> Self::Outcome {
        let base = Arc::clone(&self.0);
        LazySequence::new(seeds.next_seed(), move |stream, _| base.draw(stream))
    }
}

/// Bernoulli trial with success probability `p`.
pub fn bernoulli(p: Real) -> Result<Dist<Bernoulli, bool>> {
    let dist = Bernoulli::new(p as f64).map_err(|_| {
        Error::invalid_parameter(format!("bernoulli probability must be in [0, 1], got {}", p))
    })?;
    Ok(Dist::new(dist))
}

/// Exponential holding time with the given rate.
pub fn exponential(rate: Real) -> Result<Dist<Exp<Real>, Real>> {
    if !(rate.is_finite() && rate > 0.0) {
        return Err(Error::invalid_parameter(format!(
            "exponential rate must be positive and finite, got {}",
            rate
        )));
    }
    let dist = Exp::new(rate)
        .map_err(|e| Error::invalid_parameter(format!("exponential rate {}: {}", rate, e)))?;
    Ok(Dist::new(dist))
}

pub fn normal(mean: Real, sd: Real) -> Result<Dist<Normal<Real>, Real>> {
    if !mean.is_finite() || !(sd.is_finite() && sd >= 0.0) {
        return Err(Error::invalid_parameter(format!(
            "normal needs a finite mean and sd >= 0, got mean {} and sd {}",
            mean, sd
        )));
    }
    let dist = Normal::new(mean, sd)
        .map_err(|e| Error::invalid_parameter(format!("normal({}, {}): {}", mean, sd, e)))?;
    Ok(Dist::new(dist))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    #[test]
    fn fixed_seed_replays_draws() {
        let space = SampleSpace::new(|stream: &mut Stream| stream.gen::<u32>());
        let mut s1 = Stream::seed_from_u64(0);
        let mut s2 = Stream::seed_from_u64(0);
        let a: Vec<_> = (0..8).map(|_| space.draw(&mut s1)).collect();
        let b: Vec<_> = (0..8).map(|_| space.draw(&mut s2)).collect();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
    }

    #[test]
    fn pair_draws_each_component_once_in_order() {
        let left = SampleSpace::new(|_: &mut Stream| "left");
        let right = SampleSpace::new(|_: &mut Stream| 2);
        let mut seeds = Stream::seed_from_u64(1);
        assert_eq!(left.pair(right).draw(&mut seeds), ("left", 2));

        let mut calls: u64 = 0;
        let mut counting = seed::SeedFn(|| {
            calls += 1;
            calls
        });
        let u = SampleSpace::new(|stream: &mut Stream| stream.gen::<u64>());
        let v = SampleSpace::new(|stream: &mut Stream| stream.gen::<u64>());
        let (a, b) = u.pair(v).draw(&mut counting);
        assert_ne!(a, b);
        drop(counting);
        assert_eq!(calls, 2);
    }

    #[test]
    fn repeat_is_lazy_and_self_consistent() {
        let times = exponential(1.0).unwrap().repeat();
        let mut seeds = Stream::seed_from_u64(5);
        let seq = times.draw(&mut seeds);
        assert_eq!(seq.memoized(), 0);
        let x3 = seq.at(3);
        assert_eq!(seq.memoized(), 4);
        assert_eq!(seq.at(3).to_bits(), x3.to_bits());
        assert!(seq.prefix(100).iter().all(|&x| x > 0.0));

        let other = times.draw(&mut seeds);
        assert_ne!(other.prefix(4), seq.prefix(4));
    }

    #[test]
    fn repeated_exponentials_have_unit_mean() {
        let times = Dist::<_, Real>::new(rand_distr::Exp1).repeat();
        let seq: LazySequence<Real> = times.draw(&mut Stream::seed_from_u64(11));
        let n = 20_000;
        let mean = seq.prefix(n).iter().sum::<Real>() / n as Real;
        assert!((mean - 1.0).abs() < 0.05, "mean = {}", mean);
    }

    #[test]
    fn arc_spaces_are_shared() {
        let space = Arc::new(bernoulli(1.0).unwrap());
        let mut seeds = Stream::seed_from_u64(2);
        assert!(Arc::clone(&space).draw(&mut seeds));
        assert!(space.draw(&mut seeds));
    }

    #[test]
    fn invalid_parameters_fail_fast() {
        assert!(matches!(bernoulli(1.5), Err(Error::InvalidParameter(_))));
        assert!(matches!(bernoulli(-0.1), Err(Error::InvalidParameter(_))));
        assert!(matches!(exponential(0.0), Err(Error::InvalidParameter(_))));
        assert!(matches!(exponential(Real::NAN), Err(Error::InvalidParameter(_))));
        assert!(matches!(normal(0.0, -1.0), Err(Error::InvalidParameter(_))));
        assert!(normal(0.0, 1.0).is_ok());
    }
}

// -- end of file --
