use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Pseudo-random stream backing every realized draw.
pub type Stream = ChaCha8Rng;

/// Supplier of integer seeds, consulted once per top-level draw.
pub trait SeedSource {
    fn next_seed(&mut self) -> u64;
}

impl<R: RngCore + ?Sized> SeedSource for R {
    fn next_seed(&mut self) -> u64 {
        self.next_u64()
    }
}

/// Adapts a parameterless seed helper into a [`SeedSource`].
pub struct SeedFn<F>(pub F);

impl<F: FnMut() -> u64> RngCore for SeedFn<F> {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }
    fn next_u64(&mut self) -> u64 {
        (self.0)()
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Seed source for non-reproducible runs.
pub fn entropy() -> Stream {
    Stream::from_entropy()
}

/// Fresh stream for one draw.
pub(crate) fn stream<S: SeedSource + ?Sized>(seeds: &mut S) -> Stream {
    Stream::seed_from_u64(seeds.next_seed())
}


// -- end of file --
