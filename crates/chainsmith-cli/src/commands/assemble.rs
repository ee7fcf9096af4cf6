use crate::cli::AssembleArgs;
use crate::error::Result;
use crate::recipe::Recipe;
use crate::utils::progress::CliProgressHandler;
use chainsmith::core::models::compound::Compound;
use chainsmith::engine::config::{ChainConfig, ChainConfigBuilder, FillOptions};
use chainsmith::engine::error::AssemblyError;
use chainsmith::engine::progress::ProgressReporter;
use chainsmith::workflows;
use nalgebra::Point3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::FRAC_PI_2;
use std::fmt::Write;
use tracing::{info, warn};

const CHAIN_MEMBER_LABEL: &str = "chain";

/// Headline numbers of an assembled system.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySummary {
    pub seed: u64,
    pub chains: usize,
    pub particles: usize,
    pub bonds: usize,
    pub ports: usize,
    pub open_ports: usize,
    pub center: Option<Point3<f64>>,
    /// Distance between the anchors of a chain's open head and open tail ports.
    pub end_to_end: Option<f64>,
}

pub fn run(args: AssembleArgs, show_progress: bool) -> Result<()> {
    let mut recipe = Recipe::from_file(&args.recipe)?;
    recipe.apply_set_values(&args.set_values)?;

    let config = chain_config(&recipe, &args)?;
    let seed = args.seed.or(recipe.seed).unwrap_or_else(rand::random);
    info!("Using random seed {} (pass --seed {} to reproduce).", seed, seed);
    if config.perturbation > FRAC_PI_2 {
        warn!(
            "Perturbation bound {} rad exceeds a right angle; consecutive monomers may fold back.",
            config.perturbation
        );
    }

    let progress_handler = CliProgressHandler::new(show_progress);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let (system, summary) = assemble(&recipe, &config, seed, &reporter)?;

    println!("{}", format_summary(&summary));
    if args.list_particles {
        print!("{}", format_particles(&system));
    }
    Ok(())
}

/// Merges the recipe's `[chain]` section with command-line overrides.
pub fn chain_config(recipe: &Recipe, args: &AssembleArgs) -> Result<ChainConfig> {
    let mut builder = ChainConfigBuilder::new();
    if let Some(length) = args.length.or(recipe.chain.length) {
        builder = builder.length(length);
    }
    if let Some(perturbation) = args.perturbation.or(recipe.chain.perturbation) {
        builder = builder.perturbation(perturbation);
    }
    if let Some(head) = &recipe.chain.head_port {
        builder = builder.head_port(head);
    }
    if let Some(tail) = &recipe.chain.tail_port {
        builder = builder.tail_port(tail);
    }
    Ok(builder.build().map_err(AssemblyError::from)?)
}

/// Builds the monomer, grows one chain and lays out copies of it on the recipe's pattern.
///
/// All randomness (perturbations, random patterns, random orientations) is drawn from a
/// single generator seeded with `seed`, in that order.
pub fn assemble(
    recipe: &Recipe,
    config: &ChainConfig,
    seed: u64,
    reporter: &ProgressReporter,
) -> Result<(Compound, AssemblySummary)> {
    let monomer = recipe.monomer.build()?;
    let mut rng = StdRng::seed_from_u64(seed);

    let chain = workflows::chain::build_chain_with(&monomer, config, &mut rng, reporter)?;
    let end_to_end = end_to_end_distance(&chain, config);

    let (system, chains) = match &recipe.layout {
        None => (chain, 1),
        Some(layout) => {
            let mut pattern = layout.pattern.generate(&mut rng)?;
            pattern.scale(layout.scale);
            let options = FillOptions {
                random_orientation: layout.random_orientation,
                member_label: CHAIN_MEMBER_LABEL.to_string(),
                ..FillOptions::default()
            };
            let system =
                workflows::fill::fill_pattern(&chain, &pattern, &options, &mut rng, reporter)?;
            (system, pattern.len())
        }
    };

    let summary = AssemblySummary {
        seed,
        chains,
        particles: system.particle_count(),
        bonds: system.bonds().len(),
        ports: system.port_count(),
        open_ports: system.available_ports().count(),
        center: system.center(),
        end_to_end,
    };
    Ok((system, summary))
}

fn end_to_end_distance(chain: &Compound, config: &ChainConfig) -> Option<f64> {
    let root = chain.root();
    let first = chain.node_by_label(root, &format!("{}[0]", config.monomer_label))?;
    let last = chain.node_by_label(
        root,
        &format!("{}[{}]", config.monomer_label, config.length - 1),
    )?;
    let head = chain.port_by_label(first, &config.head_port)?;
    let tail = chain.port_by_label(last, &config.tail_port)?;
    Some((chain.anchor_position(tail)? - chain.anchor_position(head)?).norm())
}

pub fn format_summary(summary: &AssemblySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Assembled {} chain(s) (seed {})",
        summary.chains, summary.seed
    );
    let _ = writeln!(out, "  Particles : {}", summary.particles);
    let _ = writeln!(out, "  Bonds     : {}", summary.bonds);
    let _ = writeln!(
        out,
        "  Ports     : {} ({} open)",
        summary.ports, summary.open_ports
    );
    match summary.center {
        Some(c) => {
            let _ = writeln!(out, "  Centroid  : ({:.4}, {:.4}, {:.4})", c.x, c.y, c.z);
        }
        None => {
            let _ = writeln!(out, "  Centroid  : n/a");
        }
    }
    match summary.end_to_end {
        Some(d) => {
            let _ = write!(out, "  End-to-end: {:.4} per chain", d);
        }
        None => {
            let _ = write!(out, "  End-to-end: n/a");
        }
    }
    out
}

/// Lists every particle as `index name x y z`, in traversal order.
pub fn format_particles(system: &Compound) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>6} {:<6} {:>10} {:>10} {:>10}", "#", "name", "x", "y", "z");
    for (i, (_, particle)) in system.particles().enumerate() {
        let p = particle.position;
        let _ = writeln!(
            out,
            "{:>6} {:<6} {:>10.4} {:>10.4} {:>10.4}",
            i, particle.name, p.x, p.y, p.z
        );
    }
    out
}
