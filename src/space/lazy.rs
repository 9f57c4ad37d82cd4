use crate::{
    error::{Error, Result},
    seed::Stream,
};
use rand::SeedableRng;
use std::{cell::RefCell, fmt, sync::Arc};
use tracing::trace;

/// Step rule of a [`LazySequence`]: maps the continuing stream and the
/// previous value (`None` at index 0) to the next value.
pub type Step<T> = Arc<dyn Fn(&mut Stream, Option<&T>) -> T + Send + Sync>;

struct Memo<T> {
    stream: Stream,
    values: Vec<T>,
}

/// Infinite, memoized sequence indexed by the non-negative integers.
///
/// Index `n` is the value reached after `n + 1` applications of the step
/// rule to one stream seeded with `seed`, so the whole sequence is a pure
/// function of `(seed, index)`. Values are computed on first access and
/// cached for the lifetime of the sequence; querying indices in any order
/// never changes what was already returned.
pub struct LazySequence<T> {
    seed: u64,
    step: Step<T>,
    memo: RefCell<Memo<T>>,
}

impl<T: Clone> LazySequence<T> {
    pub fn new<F>(seed: u64, step: F) -> Self
    where
        F: Fn(&mut Stream, Option<&T>) -> T + Send + Sync + 'static,
    {
        Self::with_step(seed, Arc::new(step))
    }

    pub fn with_step(seed: u64, step: Step<T>) -> Self {
        LazySequence {
            seed,
            step,
            memo: RefCell::new(Memo {
                stream: Stream::seed_from_u64(seed),
                values: Vec::new(),
            }),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values computed so far.
    pub fn memoized(&self) -> usize {
        self.memo.borrow().values.len()
    }

    pub fn at(&self, index: usize) -> T {
        let mut memo = self.memo.borrow_mut();
        let len = memo.values.len();
        if index >= len {
            trace!(seed = self.seed, from = len, to = index, "extending lazy sequence");
            let Memo { stream, values } = &mut *memo;
            values.reserve((index - len).saturating_add(1));
            for _ in len..=index {
                let next = (self.step)(stream, values.last());
                values.push(next);
            }
        }
        memo.values[index].clone()
    }

    /// Checked access for signed indices.
    pub fn try_at(&self, index: i64) -> Result<T> {
        if index < 0 {
            return Err(Error::domain(format!(
                "sequence index must be non-negative, got {}",
                index
            )));
        }
        Ok(self.at(index as usize))
    }

    /// First `len` values.
    pub fn prefix(&self, len: usize) -> Vec<T> {
        if len == 0 {
            return Vec::new();
        }
        self.at(len - 1);
        self.memo.borrow().values[..len].to_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..).map(move |n| self.at(n))
    }
}

impl<T: Clone> Clone for LazySequence<T> {
    fn clone(&self) -> Self {
        let memo = self.memo.borrow();
        LazySequence {
            seed: self.seed,
            step: Arc::clone(&self.step),
            memo: RefCell::new(Memo {
                stream: memo.stream.clone(),
                values: memo.values.clone(),
            }),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LazySequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LazySequence")
            .field("seed", &self.seed)
            .field("memoized", &self.memo.borrow().values)
            .finish()
    }
}


// -- end of file --
