use super::{check_distribution, check_labels, Matrix};
use crate::{
    error::{Error, Result},
    process::RandomProcess,
    real::Real,
    seed::{SeedSource, Stream},
    space::{LazySequence, Sampleable},
};
use rand::distributions::{Distribution, WeightedIndex};
use std::sync::Arc;
use tracing::debug;

/// Initial law and one categorical law per row.
struct Kernel {
    initial: WeightedIndex<Real>,
    rows: Vec<WeightedIndex<Real>>,
}

impl Kernel {
    fn new(transition_matrix: &[Vec<Real>], initial_dist: &[Real]) -> Result<Self> {
        let weighted = |what: String, p: &[Real]| {
            WeightedIndex::<Real>::new(p).map_err(|e| Error::invalid_parameter(format!("{}: {}", what, e)))
        };
        let initial = weighted("initial distribution".to_string(), initial_dist)?;
        let rows = transition_matrix
            .iter()
            .enumerate()
            .map(|(i, row)| weighted(format!("row {} of the transition matrix", i), row))
            .collect::<Result<_>>()?;
        Ok(Kernel { initial, rows })
    }

    fn step(&self, stream: &mut Stream, prev: Option<&usize>) -> usize {
        match prev {
            None => self.initial.sample(stream),
            Some(&state) => self.rows[state].sample(stream),
        }
    }
}

/// Trajectories of a finite chain.
///
/// Each draw takes one seed and returns the state path as a
/// [`LazySequence`], so every index of one draw belongs to the same walk.
pub struct ChainSpace {
    kernel: Arc<Kernel>,
}

impl Sampleable for ChainSpace {
    type Outcome = LazySequence<usize>;

    fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> Self::Outcome {
        let kernel = Arc::clone(&self.kernel);
        LazySequence::new(seeds.next_seed(), move |stream, prev| {
            kernel.step(stream, prev)
        })
    }
}

/// Discrete-time Markov chain over states `0..m`, optionally relabeled.
pub struct MarkovChain<L = usize> {
    transition_matrix: Matrix,
    initial_dist: Vec<Real>,
    labels: Arc<Vec<L>>,
    process: RandomProcess<ChainSpace, L>,
}

impl MarkovChain<usize> {
    pub fn new(transition_matrix: Matrix, initial_dist: Vec<Real>) -> Result<Self> {
        let m = initial_dist.len();
        if m == 0 {
            return Err(Error::invalid_parameter("a chain needs at least one state"));
        }
        check_distribution("initial distribution", &initial_dist)?;
        if transition_matrix.len() != m {
            return Err(Error::invalid_parameter(format!(
                "transition matrix has {} rows, expected {}",
                transition_matrix.len(),
                m
            )));
        }
        for (i, row) in transition_matrix.iter().enumerate() {
            if row.len() != m {
                return Err(Error::invalid_parameter(format!(
                    "row {} of the transition matrix has {} entries, expected {}",
                    i,
                    row.len(),
                    m
                )));
            }
            check_distribution(&format!("row {} of the transition matrix", i), row)?;
        }

        let kernel = Kernel::new(&transition_matrix, &initial_dist)?;
        debug!(states = m, "built markov chain");
        let space = Arc::new(ChainSpace {
            kernel: Arc::new(kernel),
        });
        Ok(MarkovChain::assemble(
            transition_matrix,
            initial_dist,
            space,
            (0..m).collect(),
        ))
    }
}

impl<L> MarkovChain<L>
where
    L: Clone + Send + Sync + 'static,
{
    fn assemble(
        transition_matrix: Matrix,
        initial_dist: Vec<Real>,
        space: Arc<ChainSpace>,
        labels: Vec<L>,
    ) -> Self {
        let labels = Arc::new(labels);
        let lookup = Arc::clone(&labels);
        let process = RandomProcess::sequence(space, move |path: &LazySequence<usize>, n| {
            lookup[path.at(n)].clone()
        });
        MarkovChain {
            transition_matrix,
            initial_dist,
            labels,
            process,
        }
    }

    /// Same chain reporting `labels[state]` instead of the state index.
    pub fn with_labels<K>(self, labels: Vec<K>) -> Result<MarkovChain<K>>
    where
        K: Clone + Send + Sync + 'static,
    {
        check_labels(&labels, self.num_states())?;
        Ok(MarkovChain::assemble(
            self.transition_matrix,
            self.initial_dist,
            Arc::clone(self.process.space()),
            labels,
        ))
    }

    pub fn num_states(&self) -> usize {
        self.initial_dist.len()
    }

    pub fn transition_matrix(&self) -> &Matrix {
        &self.transition_matrix
    }

    pub fn initial_dist(&self) -> &[Real] {
        &self.initial_dist
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    pub fn space(&self) -> &Arc<ChainSpace> {
        self.process.space()
    }

    pub fn process(&self) -> &RandomProcess<ChainSpace, L> {
        &self.process
    }

    pub fn into_process(self) -> RandomProcess<ChainSpace, L> {
        self.process
    }

    pub fn draw<S: SeedSource + ?Sized>(&self, seeds: &mut S) -> LazySequence<usize> {
        self.process.draw(seeds)
    }

    /// Labeled state after `n` steps of the realization `path`.
    pub fn at(&self, path: &LazySequence<usize>, n: Real) -> Result<L> {
        self.process.at(path, n)
    }
}


// -- end of file --
