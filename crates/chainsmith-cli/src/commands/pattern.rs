use crate::cli::{PatternArgs, PatternKind};
use crate::error::{CliError, Result};
use chainsmith::core::patterns::pattern::Pattern;
use std::fmt::Write;
use tracing::info;

pub fn run(args: PatternArgs) -> Result<()> {
    let pattern = generate(&args)?;
    info!(
        "Generated {:?} pattern with {} points (scale {}).",
        args.kind,
        pattern.len(),
        args.scale
    );
    print!("{}", format_points(&pattern));
    Ok(())
}

pub fn generate(args: &PatternArgs) -> Result<Pattern> {
    if !args.scale.is_finite() {
        return Err(CliError::Argument(format!(
            "Scale factor must be finite, got {}",
            args.scale
        )));
    }
    let mut pattern = match args.kind {
        PatternKind::Disk { n } => Pattern::disk(n)?,
        PatternKind::Grid3d { nx, ny, nz } => Pattern::grid_3d(nx, ny, nz)?,
        PatternKind::Grid2d { nx, ny } => Pattern::grid_2d(nx, ny)?,
        PatternKind::Sphere { n } => Pattern::sphere(n)?,
    };
    pattern.scale(args.scale);
    Ok(pattern)
}

/// One point per line, three space-separated coordinates.
pub fn format_points(pattern: &Pattern) -> String {
    let mut out = String::new();
    for p in pattern {
        let _ = writeln!(out, "{:.6} {:.6} {:.6}", p.x, p.y, p.z);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kind: PatternKind, scale: f64) -> PatternArgs {
        PatternArgs { kind, scale }
    }

    #[test]
    fn grid_and_disk_have_expected_sizes() {
        let grid = generate(&args(PatternKind::Grid3d { nx: 5, ny: 5, nz: 5 }, 1.0)).unwrap();
        assert_eq!(grid.len(), 125);
        let disk = generate(&args(PatternKind::Disk { n: 50 }, 1.0)).unwrap();
        assert_eq!(disk.len(), 50);
    }

    #[test]
    fn scale_is_applied() {
        let grid = generate(&args(PatternKind::Grid2d { nx: 2, ny: 2 }, 3.0)).unwrap();
        assert_eq!(grid.points()[3], nalgebra::Point3::new(1.5, 1.5, 0.0));
    }

    #[test]
    fn zero_count_and_bad_scale_are_rejected() {
        assert!(matches!(
            generate(&args(PatternKind::Sphere { n: 0 }, 1.0)),
            Err(CliError::Pattern(_))
        ));
        assert!(matches!(
            generate(&args(PatternKind::Disk { n: 3 }, f64::NAN)),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn points_are_formatted_one_per_line() {
        let grid = generate(&args(PatternKind::Grid2d { nx: 2, ny: 1 }, 1.0)).unwrap();
        assert_eq!(
            format_points(&grid),
            "0.000000 0.000000 0.000000\n0.500000 0.000000 0.000000\n"
        );
    }
}
