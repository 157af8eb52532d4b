use getref::{format::Record, reference::normalize, Error};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, trace, warn};

/// Progress of the lookups, drawn on stderr.
///
/// Notices are printed to stdout above the bar. In quiet mode neither is shown.
pub struct Progress {
    bar: ProgressBar,
    quiet: bool,
}

impl Progress {
    pub fn new(len: usize, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(len as u64)
        };

        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }

        Self { bar, quiet }
    }

    fn searching(&self, query: &str) {
        self.bar
            .set_message(format!("Searching citation for: {query}"));
        self.notice(&trying_notice(query));
    }

    fn notice(&self, message: &str) {
        if !self.quiet {
            self.bar.suspend(|| println!("{message}"));
        }
    }

    fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

pub fn trying_notice(query: &str) -> String {
    format!("Trying for {query}")
}

pub fn not_found_notice(query: &str) -> String {
    format!("Could not find ref for {query}")
}

/// Look up every reference in order, one at a time.
///
/// A failed lookup is reported and stands as an empty record so the result always has one
/// record per reference.
pub fn lookup_references<F>(references: &[String], mut lookup: F, progress: &Progress) -> Vec<String>
where
    F: FnMut(&str) -> Result<Record, Error>,
{
    references
        .iter()
        .map(|line| {
            let query = normalize(line);
            progress.searching(&query);

            let record = match lookup(&query) {
                Ok(record) => {
                    trace!("Found {} record for '{query}'", record.format());
                    record.raw()
                }
                Err(err) => {
                    progress.notice(&not_found_notice(&query));
                    if err.is_no_value() {
                        info!("{err}");
                    } else {
                        warn!("Lookup of '{query}' failed: {err}");
                    }
                    String::new()
                }
            };

            progress.inc();
            record
        })
        .collect()
}

/// Every record followed by a blank line.
pub fn render(records: &[String]) -> String {
    records
        .iter()
        .map(|record| format!("{record}\n\n"))
        .collect()
}
