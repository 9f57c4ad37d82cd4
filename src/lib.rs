//! Reproducible simulation of random processes.
//!
//! Outcomes are drawn from [`space::Sampleable`] spaces, time-indexed
//! processes are built on top of them with [`process::RandomProcess`], and
//! [`chain`] provides discrete- and continuous-time Markov chains.

pub mod chain;
pub mod error;
pub mod process;
pub mod seed;
pub mod space;

pub use crate::error::{Error, Result};

pub mod real {
    #[cfg(any(feature = "f32", not(feature = "f64")))]
    pub use std::f32::*;
    #[cfg(any(feature = "f32", not(feature = "f64")))]
    pub type Real = f32;

    #[cfg(all(feature = "f64", not(feature = "f32")))]
    pub use std::f64::*;
    #[cfg(all(feature = "f64", not(feature = "f32")))]
    pub type Real = f64;
}

// -- end of file --
