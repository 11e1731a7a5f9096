//! Progress UI (indicatif bars) for crawl and download runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cdvl_crawler::{ContentType, NoopReporter, ProgressReporter};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const SWEEP_TEMPLATE: &str = "{spinner} {prefix:>8}: {pos} ids checked, {msg}";
const BYTES_TEMPLATE: &str =
    "{prefix} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const BYTES_UNKNOWN_TEMPLATE: &str = "{spinner} {prefix} {bytes} ({bytes_per_sec})";

struct SweepBar {
    bar: ProgressBar,
    found: u64,
}

/// Renders sweep counters and download byte bars on stderr.
pub(crate) struct IndicatifReporter {
    multi: MultiProgress,
    sweeps: Mutex<HashMap<ContentType, SweepBar>>,
    download: Mutex<Option<ProgressBar>>,
}

/// The terminal reporter when `enabled`, else a no-op.
pub(crate) fn create_reporter(enabled: bool) -> Arc<dyn ProgressReporter> {
    if enabled {
        Arc::new(IndicatifReporter::new(MultiProgress::with_draw_target(
            ProgressDrawTarget::stderr(),
        )))
    } else {
        Arc::new(NoopReporter)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl IndicatifReporter {
    pub(crate) fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            sweeps: Mutex::new(HashMap::new()),
            download: Mutex::new(None),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn sweep_item(&self, content_type: ContentType, _id: u64, found: bool) {
        let mut sweeps = lock(&self.sweeps);
        let entry = sweeps.entry(content_type).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new_spinner());
            bar.set_style(style(SWEEP_TEMPLATE));
            bar.set_prefix(format!("{content_type}s"));
            bar.enable_steady_tick(Duration::from_millis(120));
            SweepBar { bar, found: 0 }
        });
        if found {
            entry.found += 1;
        }
        entry.bar.inc(1);
        entry.bar.set_message(format!("{} found", entry.found));
    }

    fn sweep_finished(&self, content_type: ContentType, records: u64) {
        if let Some(entry) = lock(&self.sweeps).get(&content_type) {
            entry.bar.finish_with_message(format!("{records} found, done"));
        }
    }

    fn download_started(&self, label: &str, initial: u64, total: Option<u64>) {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(style(BYTES_TEMPLATE));
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(style(BYTES_UNKNOWN_TEMPLATE));
                bar
            }
        };
        let bar = self.multi.add(bar);
        bar.set_prefix(label.to_string());
        bar.set_position(initial);
        if let Some(previous) = lock(&self.download).replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn bytes_transferred(&self, downloaded: u64) {
        if let Some(bar) = lock(&self.download).as_ref() {
            bar.set_position(downloaded);
        }
    }

    fn download_finished(&self) {
        if let Some(bar) = lock(&self.download).take() {
            bar.finish_and_clear();
        }
    }
}
