use crate::core::models::compound::Compound;
use crate::engine::config::{ChainConfig, ChainConfigBuilder};
use crate::engine::error::AssemblyError;
use crate::engine::growth::{ChainGrowth, GrowthState};
use crate::engine::progress::{Progress, ProgressReporter};
use rand::Rng;
use tracing::{info, instrument};

/// Grows a chain of `length` copies of `prototype` using the default `head`/`tail` ports.
///
/// # Arguments
///
/// * `prototype` - The monomer to clone; it is never modified.
/// * `length` - Number of monomers, at least one.
/// * `perturbation` - Bound in radians of the random tilt between consecutive monomers.
/// * `rng` - The source of randomness; untouched when `perturbation` is zero.
///
/// # Return
///
/// A compound named `Polymer` with children `monomer[0]` to `monomer[length - 1]`.
pub fn build_chain<R: Rng + ?Sized>(
    prototype: &Compound,
    length: usize,
    perturbation: f64,
    rng: &mut R,
) -> Result<Compound, AssemblyError> {
    let config = ChainConfigBuilder::new()
        .length(length)
        .perturbation(perturbation)
        .build()?;
    build_chain_with(prototype, &config, rng, &ProgressReporter::new())
}

/// Grows a chain as described by `config`, reporting one task increment per monomer.
#[instrument(skip_all, name = "chain_growth_workflow")]
pub fn build_chain_with<R: Rng + ?Sized>(
    prototype: &Compound,
    config: &ChainConfig,
    rng: &mut R,
    reporter: &ProgressReporter,
) -> Result<Compound, AssemblyError> {
    let mut growth = ChainGrowth::new(prototype, config)?;
    info!(
        "Growing chain of {} '{}' monomers (perturbation {} rad).",
        config.length,
        prototype.name(),
        config.perturbation
    );

    reporter.report(Progress::PhaseStart {
        name: "Chain Growth",
    });
    reporter.report(Progress::TaskStart {
        total_steps: config.length as u64,
    });
    loop {
        let state = growth.step(rng)?;
        reporter.report(Progress::TaskIncrement);
        if state == GrowthState::Done {
            break;
        }
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let chain = growth.finish();
    info!(
        "Chain complete: {} particles, {} bonds.",
        chain.particle_count(),
        chain.bonds().len()
    );
    Ok(chain)
}
