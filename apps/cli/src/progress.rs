use std::{sync::Mutex, time::Duration};

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sermondl_core::{ProgressSink, RunObserver, SermonRecord, TaskOutcome, TransferProgress};

use crate::format::{format_metadata, format_outcome, format_size};

const TITLE_WIDTH: usize = 40;

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Print above the active bars. Hidden bars (stdout is not a terminal) swallow
/// println, so fall back to plain stdout.
fn print_line(multi: &MultiProgress, line: String) {
    if multi.is_hidden() {
        println!("{}", line);
    } else {
        let _ = multi.println(line);
    }
}

fn short_title(title: &str) -> String {
    if title.chars().count() <= TITLE_WIDTH {
        title.to_string()
    } else {
        let cut: String = title.chars().take(TITLE_WIDTH - 1).collect();
        format!("{}…", cut)
    }
}

/// One byte-level bar per active download.
pub struct BarProgress {
    multi: MultiProgress,
}

impl BarProgress {
    pub fn new(multi: MultiProgress) -> Self {
        Self { multi }
    }
}

struct BarTransfer {
    pb: ProgressBar,
}

impl ProgressSink for BarProgress {
    fn begin(&self, title: &str, total_bytes: Option<u64>) -> Box<dyn TransferProgress> {
        print_line(&self.multi, format_size(title, total_bytes));
        let pb = match total_bytes {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{msg:40} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec}")
                        .unwrap()
                        .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{msg:40} {spinner:.cyan} {bytes} {bytes_per_sec}")
                        .unwrap(),
                );
                pb
            }
        };
        pb.set_message(short_title(title));
        Box::new(BarTransfer {
            pb: self.multi.add(pb),
        })
    }
}

impl TransferProgress for BarTransfer {
    fn advance(&mut self, bytes: u64) {
        self.pb.inc(bytes);
    }

    fn finish(&mut self) {
        self.pb.finish_and_clear();
    }

    fn abandon(&mut self) {
        self.pb.abandon();
    }
}

/// Drives the discovery spinner and prints a status block per sermon above the
/// active bars.
pub struct CliObserver {
    multi: MultiProgress,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliObserver {
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            spinner: Mutex::new(None),
        }
    }

    /// Stop the discovery spinner without a result line.
    pub fn clear_spinner(&self) {
        if let Some(spinner) = self.spinner.lock().expect("spinner poisoned").take() {
            spinner.finish_and_clear();
        }
    }
}

impl RunObserver for CliObserver {
    fn discovery_started(&self, _series_url: &str) {
        let spinner = create_spinner("Discovering sermons...");
        *self.spinner.lock().expect("spinner poisoned") = Some(spinner);
    }

    fn discovery_finished(&self, count: usize) {
        if let Some(spinner) = self.spinner.lock().expect("spinner poisoned").take() {
            spinner.finish_with_message(format!(
                "{} Found {} sermons",
                style("✓").green().bold(),
                style(count).cyan().bold()
            ));
        }
    }

    fn sermon_metadata(&self, index: usize, total: usize, record: &SermonRecord) {
        print_line(&self.multi, format_metadata(index, total, record));
    }

    fn sermon_finished(&self, index: usize, total: usize, outcome: &TaskOutcome) {
        print_line(&self.multi, format_outcome(index, total, outcome));
    }
}
