use crate::core::models::compound::Compound;
use crate::core::patterns::pattern::Pattern;
use crate::core::utils::geometry::Axis;
use crate::engine::config::FillOptions;
use crate::engine::error::AssemblyError;
use crate::engine::progress::{Progress, ProgressReporter};
use rand::Rng;
use std::f64::consts::TAU;
use tracing::{debug, info, instrument};

/// Places one copy of `template` on every point of `pattern`.
///
/// Each copy is cloned from the unchanged template, optionally spun about x, y and z through
/// its centroid by uniform angles in `[0, 2π)`, translated by the point's coordinates and
/// added as a non-bonded member of a new system compound (labels `member[0]`, `member[1]`,
/// ...). Randomness is drawn only when `options.random_orientation` is set.
///
/// # Errors
///
/// Propagates [`AssemblyError::Model`] from inserting or spinning a member.
#[instrument(skip_all, name = "pattern_fill_workflow")]
pub fn fill_pattern<R: Rng + ?Sized>(
    template: &Compound,
    pattern: &Pattern,
    options: &FillOptions,
    rng: &mut R,
    reporter: &ProgressReporter,
) -> Result<Compound, AssemblyError> {
    info!(
        "Placing {} copies of '{}' (random orientation: {}).",
        pattern.len(),
        template.name(),
        options.random_orientation
    );
    reporter.report(Progress::PhaseStart {
        name: "Pattern Fill",
    });
    if options.random_orientation {
        reporter.report(Progress::Message(format!(
            "Each copy of '{}' is spun about x, y and z by random angles",
            template.name()
        )));
    }
    reporter.report(Progress::TaskStart {
        total_steps: pattern.len() as u64,
    });

    let mut system = Compound::new(&options.system_name);
    let root = system.root();
    let label = format!("{}[$]", options.member_label);

    for point in pattern {
        let mut member = template.clone();
        if options.random_orientation {
            for axis in [Axis::X, Axis::Y, Axis::Z] {
                member.spin(&axis.unit(), rng.gen_range(0.0..TAU))?;
            }
        }
        member.translate(&point.coords);
        system.add_compound(root, Some(&label), member)?;
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    debug!(
        "System '{}' holds {} particles.",
        system.name(),
        system.particle_count()
    );
    Ok(system)
}
