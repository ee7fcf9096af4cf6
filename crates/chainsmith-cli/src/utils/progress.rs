use chainsmith::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Renders engine progress events as a single terminal progress bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    /// Creates a handler drawing to stderr, or drawing nothing when `visible` is false.
    pub fn new(visible: bool) -> Self {
        let pb = ProgressBar::new(0).with_style(Self::spinner_style());
        pb.set_draw_target(if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        });
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = Arc::clone(&self.pb);

        Box::new(move |progress: Progress| {
            let Ok(mut bar) = pb.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };
            Self::apply(&mut bar, progress);
        })
    }

    fn apply(bar: &mut ProgressBar, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                bar.reset();
                bar.set_length(0);
                bar.set_style(Self::spinner_style());
                bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                bar.set_message(name);
            }
            Progress::PhaseFinish => {
                bar.disable_steady_tick();
                bar.finish_with_message("✓ Done");
            }
            Progress::TaskStart { total_steps } => {
                bar.disable_steady_tick();
                bar.set_length(total_steps);
                bar.set_position(0);
                bar.set_style(Self::bar_style());
            }
            Progress::TaskIncrement => bar.inc(1),
            Progress::TaskFinish => {
                let total = bar.length().unwrap_or(0);
                if bar.position() < total {
                    bar.set_position(total);
                }
            }
            Progress::Message(msg) => {
                if bar.is_finished() {
                    bar.set_message(msg);
                } else {
                    bar.println(format!("  {}", msg));
                }
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Failed to create spinner style template")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<16} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("Failed to create bar style template")
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("=>-")
    }
}
