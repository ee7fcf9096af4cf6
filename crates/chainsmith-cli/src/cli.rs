use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The Chainsmith Developers",
    version,
    about = "Chainsmith CLI - Assemble polymers and multi-chain systems from port-bearing monomers.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a monomer from a recipe, grow a chain and optionally lay out copies of it.
    Assemble(AssembleArgs),
    /// Print the points of a spatial pattern.
    Pattern(PatternArgs),
}

/// Arguments for the `assemble` subcommand.
#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Path to the assembly recipe in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub recipe: PathBuf,

    /// Override the number of monomers per chain.
    #[arg(short = 'n', long, value_name = "INT")]
    pub length: Option<usize>,

    /// Override the random seed. A fresh seed is drawn (and logged) when none is given.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the bound, in radians, of the random tilt between consecutive monomers.
    #[arg(short, long, value_name = "RADIANS")]
    pub perturbation: Option<f64>,

    /// Set a specific recipe value, overriding the recipe file.
    /// Can be used multiple times. Example: -S chain.length=20
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// Print every particle of the assembled system after the summary.
    #[arg(long)]
    pub list_particles: bool,
}

/// Arguments for the `pattern` subcommand.
#[derive(Args, Debug)]
pub struct PatternArgs {
    #[command(subcommand)]
    pub kind: PatternKind,

    /// Multiply every coordinate by this factor.
    #[arg(long, value_name = "FLOAT", default_value_t = 1.0, global = true)]
    pub scale: f64,
}

/// Available point-set generators.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Sunflower layout of N points on the unit disk.
    Disk {
        #[arg(value_name = "N")]
        n: usize,
    },
    /// Regular NX x NY x NZ grid in the unit cube.
    #[command(name = "grid-3d")]
    Grid3d {
        #[arg(value_name = "NX")]
        nx: usize,
        #[arg(value_name = "NY")]
        ny: usize,
        #[arg(value_name = "NZ")]
        nz: usize,
    },
    /// Regular NX x NY grid in the unit square.
    #[command(name = "grid-2d")]
    Grid2d {
        #[arg(value_name = "NX")]
        nx: usize,
        #[arg(value_name = "NY")]
        ny: usize,
    },
    /// Fibonacci layout of N points on the unit sphere.
    Sphere {
        #[arg(value_name = "N")]
        n: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn assemble_parses_overrides() {
        let cli = Cli::try_parse_from([
            "chainsmith",
            "-vv",
            "assemble",
            "-r",
            "recipe.toml",
            "--length",
            "12",
            "--seed",
            "7",
            "-p",
            "0.1",
            "-S",
            "chain.head-port=up",
            "--list-particles",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Assemble(args) = cli.command else {
            panic!("expected the assemble command");
        };
        assert_eq!(args.recipe, PathBuf::from("recipe.toml"));
        assert_eq!(args.length, Some(12));
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.perturbation, Some(0.1));
        assert_eq!(args.set_values, vec!["chain.head-port=up".to_string()]);
        assert!(args.list_particles);
    }

    #[test]
    fn assemble_requires_a_recipe() {
        assert!(Cli::try_parse_from(["chainsmith", "assemble"]).is_err());
    }

    #[test]
    fn pattern_parses_kind_and_scale() {
        let cli =
            Cli::try_parse_from(["chainsmith", "pattern", "grid-3d", "5", "5", "5", "--scale", "2.5"])
                .unwrap();
        let Commands::Pattern(args) = cli.command else {
            panic!("expected the pattern command");
        };
        assert_eq!(args.kind, PatternKind::Grid3d { nx: 5, ny: 5, nz: 5 });
        assert_eq!(args.scale, 2.5);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["chainsmith", "-q", "-v", "pattern", "disk", "3"]).is_err());
    }
}
