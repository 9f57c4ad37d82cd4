use probsim::{
    chain::{ContinuousTimeMarkovChain, MarkovChain},
    real::Real,
    seed::Stream,
};
use rand::SeedableRng;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), probsim::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut seeds = Stream::seed_from_u64(0);
    let ndraws = 10_000;

    // --------------------

    let weather = MarkovChain::new(
        vec![
            vec![0.7, 0.2, 0.1],
            vec![0.3, 0.5, 0.2],
            vec![0.2, 0.4, 0.4],
        ],
        vec![1.0, 0.0, 0.0],
    )?
    .with_labels(vec!["sunny", "cloudy", "rainy"])?;

    let path = weather.draw(&mut seeds);
    let times: Vec<Real> = (0..10).map(|n| n as Real).collect();
    info!("weather path: {:?}", weather.process().path(&path, &times)?);

    let timer = Instant::now();
    let day = 30.0;
    let values = weather.process().sim_at(ndraws, day, &mut seeds)?;
    for label in weather.labels() {
        let freq = values.iter().filter(|v| *v == label).count() as Real / ndraws as Real;
        info!("P(X_{} = {}) ~ {:.4}", day, label, freq);
    }
    info!("markov chain: {} draws in {:?}", ndraws, timer.elapsed());

    // --------------------

    let ctmc = ContinuousTimeMarkovChain::new(
        vec![vec![-1.0, 1.0], vec![2.0, -2.0]],
        vec![1.0, 0.0],
    )?;
    info!("embedded chain: {:?}", ctmc.transition_matrix());
    info!("holding rates: {:?}", ctmc.holding_rates());

    let path = ctmc.draw(&mut seeds);
    let jumps = ctmc.jump_times();
    let jump_times: Vec<Real> = (0..5)
        .map(|n| jumps.at(&path, n as Real))
        .collect::<Result<_, _>>()?;
    info!("first jump times: {:?}", jump_times);

    let timer = Instant::now();
    let gaps = ctmc.interjump_times();
    let first = gaps.sim_at(ndraws, 0.0, &mut seeds)?;
    let mean = first.iter().sum::<Real>() / ndraws as Real;
    info!("mean holding time in state 0: {:.4} (expected 1)", mean);

    let t = 2.0;
    let states = ctmc.process().sim_at(ndraws, t, &mut seeds)?;
    let p1 = states.iter().filter(|&&s| s == 1).count() as Real / ndraws as Real;
    info!("P(X({}) = 1) ~ {:.4}", t, p1);
    info!("continuous-time chain: {} draws in {:?}", 2 * ndraws, timer.elapsed());

    Ok(())
}

// -- end of file --
