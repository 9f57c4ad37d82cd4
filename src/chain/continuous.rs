use super::{check_labels, discrete::ChainSpace, MarkovChain, Matrix, GENERATOR_TOLERANCE};
use crate::{
    error::{Error, Location, Result, Violation},
    process::RandomProcess,
    real::Real,
    seed::SeedSource,
    space::{Dist, LazySequence, Pair, Repeat, Sampleable},
};
use itertools::{FoldWhile, Itertools};
use rand_distr::Exp1;
use std::sync::Arc;
use tracing::debug;

/// Joint realization of a continuous-time chain: the embedded state path
/// and the unit-rate exponential draws later scaled into holding times.
#[derive(Clone, Debug)]
pub struct JumpPath {
    pub states: LazySequence<usize>,
    pub holding_draws: LazySequence<Real>,
}

/// Sample space pairing embedded-chain paths with i.i.d. `Exp(1)` draws.
pub struct JumpSpace {
    joint: Pair<Arc<ChainSpace>, Repeat<Dist<Exp1, Real>>>,
}

impl Sampleable for JumpSpace {
    type Outcome = JumpPath;

    fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> JumpPath {
        let (states, holding_draws) = self.joint.draw(seeds);
        JumpPath {
            states,
            holding_draws,
        }
    }
}

/// Holding rate of every state.
struct Clock {
    rates: Vec<Real>,
}

impl Clock {
    /// Time spent in the state occupied during the `n`-th interval.
    fn sojourn(&self, path: &JumpPath, n: usize) -> Real {
        let rate = self.rates[path.states.at(n)];
        if rate > 0.0 {
            path.holding_draws.at(n) / rate
        } else {
            Real::INFINITY
        }
    }

    /// Number of jumps made by time `t`. Paths are right-continuous: a jump
    /// landing exactly on `t` has already happened.
    fn jump_index(&self, path: &JumpPath, t: Real) -> usize {
        (0..)
            .fold_while((0.0, 0), |(total, _), n| {
                let total = total + self.sojourn(path, n);
                if total > t {
                    FoldWhile::Done((total, n))
                } else {
                    FoldWhile::Continue((total, n))
                }
            })
            .into_inner()
            .1
    }

    fn jump_time(&self, path: &JumpPath, n: usize) -> Real {
        (0..n).map(|i| self.sojourn(path, i)).sum()
    }
}

fn invalid(location: Location, value: Real, violation: Violation) -> Error {
    Error::InvalidGenerator {
        location,
        value,
        violation,
    }
}

/// Checks shape, signs and zero row sums of a generator matrix.
pub fn check_generator(generator: &[Vec<Real>]) -> Result<()> {
    let m = generator.len();
    if m == 0 {
        return Err(invalid(Location::Matrix, 0.0, Violation::Empty));
    }
    for (i, row) in generator.iter().enumerate() {
        if row.len() != m {
            return Err(invalid(Location::row(i), row.len() as Real, Violation::NotSquare));
        }
        for (j, &q) in row.iter().enumerate() {
            if !q.is_finite() {
                return Err(invalid(Location::entry(i, j), q, Violation::NonFinite));
            }
            if j == i && q > 0.0 {
                return Err(invalid(Location::entry(i, j), q, Violation::PositiveDiagonal));
            }
            if j != i && q < 0.0 {
                return Err(invalid(Location::entry(i, j), q, Violation::NegativeOffDiagonal));
            }
        }
        let sum: Real = row.iter().sum();
        let scale = row.iter().fold(1.0, |s: Real, q| s.max(q.abs()));
        if sum.abs() > GENERATOR_TOLERANCE * scale {
            return Err(invalid(Location::row(i), sum, Violation::RowSum));
        }
    }
    Ok(())
}

/// Jump probabilities `P[i][j] = Q[i][j] / sum_{k != i} Q[i][k]`, which is
/// `-Q[i][j] / Q[i][i]` up to the rounding the row-sum check admits. A
/// state with nowhere to go is absorbing and keeps itself.
fn embed(generator: &[Vec<Real>], rates: &[Real]) -> Matrix {
    generator
        .iter()
        .zip(rates)
        .enumerate()
        .map(|(i, (row, &rate))| {
            let exit: Real = row
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &q)| q)
                .sum();
            let moves = rate > 0.0 && exit > 0.0;
            row.iter()
                .enumerate()
                .map(|(j, &q)| match (j == i, moves) {
                    (true, true) => 0.0,
                    (true, false) => 1.0,
                    (false, true) => q / exit,
                    (false, false) => 0.0,
                })
                .collect()
        })
        .collect()
}

/// Continuous-time Markov chain defined by a generator matrix.
///
/// One draw carries both the embedded state path and the holding-time
/// draws, and every derived process ([`jump_times`], [`interjump_times`],
/// [`jump_chain`]) reads that same draw.
///
/// [`jump_times`]: ContinuousTimeMarkovChain::jump_times
/// [`interjump_times`]: ContinuousTimeMarkovChain::interjump_times
/// [`jump_chain`]: ContinuousTimeMarkovChain::jump_chain
pub struct ContinuousTimeMarkovChain<L = usize> {
    generator_matrix: Matrix,
    embedded: MarkovChain,
    clock: Arc<Clock>,
    labels: Arc<Vec<L>>,
    process: RandomProcess<JumpSpace, L>,
}

impl ContinuousTimeMarkovChain<usize> {
    pub fn new(generator_matrix: Matrix, initial_dist: Vec<Real>) -> Result<Self> {
        check_generator(&generator_matrix)?;
        let m = generator_matrix.len();
        if initial_dist.len() != m {
            return Err(Error::invalid_parameter(format!(
                "initial distribution has {} entries, expected {}",
                initial_dist.len(),
                m
            )));
        }

        let rates: Vec<Real> = generator_matrix
            .iter()
            .enumerate()
            .map(|(i, row)| -row[i])
            .collect();
        let embedded = MarkovChain::new(embed(&generator_matrix, &rates), initial_dist)?;
        debug!(states = m, rates = ?rates, "built continuous-time markov chain");

        let space = Arc::new(JumpSpace {
            joint: Arc::clone(embedded.space()).pair(Dist::new(Exp1).repeat()),
        });
        let clock = Arc::new(Clock { rates });
        Ok(ContinuousTimeMarkovChain::assemble(
            generator_matrix,
            embedded,
            clock,
            space,
            (0..m).collect(),
        ))
    }
}

impl<L> ContinuousTimeMarkovChain<L>
where
    L: Clone + Send + Sync + 'static,
{
    fn assemble(
        generator_matrix: Matrix,
        embedded: MarkovChain,
        clock: Arc<Clock>,
        space: Arc<JumpSpace>,
        labels: Vec<L>,
    ) -> Self {
        let labels = Arc::new(labels);
        let (lookup, timer) = (Arc::clone(&labels), Arc::clone(&clock));
        let process = RandomProcess::continuous(space, move |path: &JumpPath, t| {
            lookup[path.states.at(timer.jump_index(path, t))].clone()
        });
        ContinuousTimeMarkovChain {
            generator_matrix,
            embedded,
            clock,
            labels,
            process,
        }
    }

    pub fn with_labels<K>(self, labels: Vec<K>) -> Result<ContinuousTimeMarkovChain<K>>
    where
        K: Clone + Send + Sync + 'static,
    {
        check_labels(&labels, self.num_states())?;
        Ok(ContinuousTimeMarkovChain::assemble(
            self.generator_matrix,
            self.embedded,
            self.clock,
            Arc::clone(self.process.space()),
            labels,
        ))
    }

    pub fn num_states(&self) -> usize {
        self.generator_matrix.len()
    }

    pub fn generator_matrix(&self) -> &Matrix {
        &self.generator_matrix
    }

    /// `-Q[i][i]` for every state `i`.
    pub fn holding_rates(&self) -> &[Real] {
        &self.clock.rates
    }

    /// Transition matrix of the embedded jump chain.
    pub fn transition_matrix(&self) -> &Matrix {
        self.embedded.transition_matrix()
    }

    pub fn embedded_chain(&self) -> &MarkovChain {
        &self.embedded
    }

    pub fn initial_dist(&self) -> &[Real] {
        self.embedded.initial_dist()
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    pub fn process(&self) -> &RandomProcess<JumpSpace, L> {
        &self.process
    }

    pub fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> JumpPath {
        self.process.draw(seeds)
    }

    /// Labeled state occupied at time `t`.
    pub fn at(&self, path: &JumpPath, t: Real) -> Result<L> {
        self.process.at(path, t)
    }

    /// Index into the embedded path of the state occupied at time `t`.
    pub fn jump_index(&self, path: &JumpPath, t: Real) -> Result<usize> {
        self.process.domain().check(t)?;
        Ok(self.clock.jump_index(path, t))
    }

    /// Holding time of the `n`-th visited state.
    pub fn sojourn(&self, path: &JumpPath, n: usize) -> Real {
        self.clock.sojourn(path, n)
    }

    /// Time of the `n`-th jump; index 0 is time 0.
    pub fn jump_times(&self) -> RandomProcess<JumpSpace, Real> {
        let clock = Arc::clone(&self.clock);
        RandomProcess::sequence(Arc::clone(self.process.space()), move |path: &JumpPath, n| {
            clock.jump_time(path, n)
        })
    }

    /// Holding time of the state occupied during the `n`-th interval.
    pub fn interjump_times(&self) -> RandomProcess<JumpSpace, Real> {
        let clock = Arc::clone(&self.clock);
        RandomProcess::sequence(Arc::clone(self.process.space()), move |path: &JumpPath, n| {
            clock.sojourn(path, n)
        })
    }

    /// Labeled state visited after `n` jumps.
    pub fn jump_chain(&self) -> RandomProcess<JumpSpace, L> {
        let lookup = Arc::clone(&self.labels);
        RandomProcess::sequence(Arc::clone(self.process.space()), move |path: &JumpPath, n| {
            lookup[path.states.at(n)].clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::Stream;
    use itertools::Itertools;
    use rand::SeedableRng;

    fn two_state() -> ContinuousTimeMarkovChain {
        ContinuousTimeMarkovChain::new(vec![vec![-1.0, 1.0], vec![2.0, -2.0]], vec![1.0, 0.0])
            .unwrap()
    }

    fn three_state() -> ContinuousTimeMarkovChain {
        ContinuousTimeMarkovChain::new(
            vec![
                vec![-2.0, 1.0, 1.0],
                vec![0.5, -1.0, 0.5],
                vec![3.0, 1.0, -4.0],
            ],
            vec![0.2, 0.5, 0.3],
        )
        .unwrap()
    }

    fn violation(generator: Matrix) -> Option<Violation> {
        match check_generator(&generator) {
            Err(Error::InvalidGenerator { violation, .. }) => Some(violation),
            _ => None,
        }
    }

    #[test]
    fn generator_rows_are_validated() {
        let ok = vec![
            vec![-2.0, 1.0, 1.0],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 1.0, -2.0],
        ];
        assert!(check_generator(&ok).is_ok());

        let row_sum = vec![
            vec![-2.0, 1.0, 2.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ];
        assert_eq!(violation(row_sum), Some(Violation::RowSum));
        assert_eq!(
            violation(vec![vec![1.0, -1.0], vec![0.0, 0.0]]),
            Some(Violation::PositiveDiagonal)
        );
        assert_eq!(
            violation(vec![vec![0.0, 0.0], vec![-1.0, -1.0]]),
            Some(Violation::NegativeOffDiagonal)
        );
        assert_eq!(violation(vec![]), Some(Violation::Empty));
        assert_eq!(violation(vec![vec![0.0, 0.0]]), Some(Violation::NotSquare));
        assert_eq!(
            violation(vec![vec![Real::NAN, 0.0], vec![0.0, 0.0]]),
            Some(Violation::NonFinite)
        );
    }

    #[test]
    fn violations_name_the_entry() {
        match check_generator(&[vec![0.0, 0.0], vec![-1.0, -1.0]]) {
            Err(Error::InvalidGenerator {
                location, value, ..
            }) => {
                assert_eq!(location, Location::entry(1, 0));
                assert_eq!(value, -1.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        match check_generator(&[vec![-2.0, 1.0, 2.0], vec![0.0; 3], vec![0.0; 3]]) {
            Err(Error::InvalidGenerator {
                location, value, ..
            }) => {
                assert_eq!(location, Location::row(0));
                assert_eq!(value, 1.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn row_sums_allow_rounding_noise() {
        let third: Real = 1.0 / 3.0;
        let generator = vec![
            vec![-1.0, third, third, third],
            vec![0.1, -0.3, 0.1, 0.1],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.7, 0.2, 0.1, -1.0],
        ];
        assert!(check_generator(&generator).is_ok());
    }

    #[test]
    fn noisy_generators_still_build_a_chain() {
        let noisy = vec![
            vec![vec![-0.3, 0.1 + 0.2], vec![1.0, -1.0]],
            vec![vec![-0.001, 0.001 + 5e-10], vec![1.0, -1.0]],
            vec![
                vec![-1.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
                vec![0.0; 4],
                vec![0.0; 4],
                vec![0.0; 4],
            ],
        ];
        for generator in noisy {
            let m = generator.len();
            let mut initial = vec![0.0; m];
            initial[0] = 1.0;
            let chain = ContinuousTimeMarkovChain::new(generator.clone(), initial).unwrap();
            for row in chain.transition_matrix() {
                assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
                let sum: Real = row.iter().sum();
                assert!((sum - 1.0).abs() < 1e-6, "sum = {}", sum);
            }
            assert_eq!(chain.holding_rates()[0], -generator[0][0]);
            let path = chain.draw(&mut Stream::seed_from_u64(3));
            assert_eq!(chain.at(&path, 0.0).unwrap(), 0);
            assert_ne!(path.states.at(1), 0);
        }
    }

    #[test]
    fn empty_generator_is_reported_as_a_whole() {
        match ContinuousTimeMarkovChain::new(vec![], vec![]) {
            Err(Error::InvalidGenerator {
                location,
                violation,
                ..
            }) => {
                assert_eq!(location, Location::Matrix);
                assert_eq!(violation, Violation::Empty);
            }
            other => panic!("unexpected {:?}", other.err()),
        }
    }

    #[test]
    fn construction_fails_without_a_chain() {
        assert!(matches!(
            ContinuousTimeMarkovChain::new(vec![vec![-1.0, 2.0], vec![1.0, -1.0]], vec![1.0, 0.0]),
            Err(Error::InvalidGenerator { .. })
        ));
        assert!(matches!(
            ContinuousTimeMarkovChain::new(vec![vec![-1.0, 1.0], vec![1.0, -1.0]], vec![1.0]),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            ContinuousTimeMarkovChain::new(vec![vec![-1.0, 1.0], vec![1.0, -1.0]], vec![0.9, 0.9]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn embedded_chain_and_rates_are_derived() {
        let chain = two_state();
        assert_eq!(chain.transition_matrix(), &vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert_eq!(chain.holding_rates(), &[1.0, 2.0]);

        let chain = three_state();
        assert_eq!(chain.transition_matrix()[0], vec![0.0, 0.5, 0.5]);
        assert_eq!(chain.transition_matrix()[2], vec![0.75, 0.25, 0.0]);
    }

    #[test]
    fn starts_in_the_initial_state() {
        let chain = two_state();
        let mut seeds = Stream::seed_from_u64(0);
        for _ in 0..200 {
            let path = chain.draw(&mut seeds);
            assert_eq!(chain.at(&path, 0.0).unwrap(), 0);
        }

        let chain = three_state();
        for _ in 0..200 {
            let path = chain.draw(&mut seeds);
            assert_eq!(chain.at(&path, 0.0).unwrap(), path.states.at(0));
        }
    }

    #[test]
    fn later_times_never_revisit_earlier_jumps() {
        let chain = three_state();
        let mut seeds = Stream::seed_from_u64(12);
        for _ in 0..50 {
            let path = chain.draw(&mut seeds);
            let times: Vec<Real> = (0..200).rev().map(|k| k as Real * 0.05).collect();
            let indices: Vec<usize> = times
                .iter()
                .map(|&t| chain.jump_index(&path, t).unwrap())
                .collect();
            assert!(indices.iter().tuple_windows().all(|(a, b)| a >= b));
            for (&t, &n) in times.iter().zip(&indices) {
                assert_eq!(chain.at(&path, t).unwrap(), path.states.at(n));
            }
        }
    }

    #[test]
    fn state_changes_exactly_at_jump_times() {
        let chain = two_state();
        let jumps = chain.jump_times();
        let path = chain.draw(&mut Stream::seed_from_u64(3));
        for n in 1..20 {
            let t = jumps.at(&path, n as Real).unwrap();
            assert_eq!(chain.at(&path, t).unwrap(), n % 2);
            assert_eq!(chain.jump_index(&path, t).unwrap(), n);
            let before = t - 1e-9 * t.max(1.0);
            if before > jumps.at(&path, (n - 1) as Real).unwrap() {
                assert_eq!(chain.at(&path, before).unwrap(), (n - 1) % 2);
            }
        }
    }

    #[test]
    fn jump_times_accumulate_interjump_times() {
        let chain = three_state();
        let jumps = chain.jump_times();
        let gaps = chain.interjump_times();
        let mut seeds = Stream::seed_from_u64(5);
        for _ in 0..20 {
            let path = chain.draw(&mut seeds);
            let jt: Vec<Real> = (0..30).map(|n| jumps.at(&path, n as Real).unwrap()).collect();
            assert_eq!(jt[0], 0.0);
            assert!(jt.iter().tuple_windows().all(|(a, b)| a <= b));
            let mut total: Real = 0.0;
            for n in 0..30 {
                assert!((jt[n] - total).abs() <= 1e-12 * total.max(1.0));
                total += gaps.at(&path, n as Real).unwrap();
            }
        }
    }

    #[test]
    fn holding_times_have_rate_of_the_state() {
        let chain = two_state();
        let gaps = chain.interjump_times();
        let mut seeds = Stream::seed_from_u64(2024);
        let n = 10_000;
        let paths = gaps.sim(n, &mut seeds);
        let first = paths.iter().map(|p| gaps.at(p, 0.0).unwrap()).sum::<Real>() / n as Real;
        let second = paths.iter().map(|p| gaps.at(p, 1.0).unwrap()).sum::<Real>() / n as Real;
        assert!((first - 1.0).abs() < 0.05, "mean in state 0 = {}", first);
        assert!((second - 0.5).abs() < 0.03, "mean in state 1 = {}", second);
    }

    #[test]
    fn derived_processes_reuse_the_draw() {
        let chain = three_state();
        let states = chain.jump_chain();
        let gaps = chain.interjump_times();
        let joint = states.zip(&gaps).unwrap();
        let path = chain.draw(&mut Stream::seed_from_u64(8));
        for n in 0..10 {
            let (s, h) = joint.at(&path, n as Real).unwrap();
            assert_eq!(s, path.states.at(n));
            let rate = chain.holding_rates()[s];
            assert_eq!(h, path.holding_draws.at(n) / rate);
            assert_eq!(h, chain.sojourn(&path, n));
        }
    }

    #[test]
    fn absorbing_state_holds_forever() {
        let chain = ContinuousTimeMarkovChain::new(vec![vec![-1.0, 1.0], vec![0.0, 0.0]], vec![1.0, 0.0])
            .unwrap();
        assert_eq!(chain.transition_matrix()[1], vec![0.0, 1.0]);
        let mut seeds = Stream::seed_from_u64(6);
        for _ in 0..20 {
            let path = chain.draw(&mut seeds);
            assert_eq!(chain.at(&path, 1.0e6).unwrap(), 1);
            assert_eq!(chain.jump_index(&path, 1.0e6).unwrap(), 1);
            assert_eq!(chain.sojourn(&path, 1), Real::INFINITY);
        }
    }

    #[test]
    fn labels_and_domain_errors() {
        let chain = two_state().with_labels(vec!['a', 'b']).unwrap();
        let path = chain.draw(&mut Stream::seed_from_u64(1));
        assert_eq!(chain.at(&path, 0.0).unwrap(), 'a');
        assert!(matches!(chain.at(&path, -1.0), Err(Error::Domain(_))));
        assert!(matches!(chain.jump_index(&path, -1.0), Err(Error::Domain(_))));
        assert!(matches!(chain.jump_times().at(&path, -1.0), Err(Error::Domain(_))));
        assert!(matches!(chain.interjump_times().at(&path, 0.5), Err(Error::Domain(_))));
        assert_eq!(path.states.memoized(), 1);
    }
}

// -- end of file --
