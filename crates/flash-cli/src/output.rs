//! Output rendering for serflash (colored log lines, progress bar)

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use flash_session::{FlashProgress, LogEntry, LogSeverity, Phase, SessionEvent};

/// Context for output rendering
pub struct OutputContext {
    pub json: bool,
    pub quiet: bool,
    bar: Option<ProgressBar>,
}

impl OutputContext {
    pub fn new(json: bool, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self {
            json,
            quiet,
            bar: None,
        }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    #[allow(dead_code)]
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Render one session event.
    ///
    /// In JSON mode every event is printed as one line of JSON; otherwise
    /// log entries go to stdout and progress drives the bar.
    pub fn render(&mut self, event: &SessionEvent) {
        if self.json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{}", line);
            }
            return;
        }

        match event {
            SessionEvent::Log { entry } => self.render_log(entry),
            SessionEvent::Progress { progress } => self.render_progress(progress),
            SessionEvent::PhaseChanged { phase } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(phase.to_string());
                }
            }
            SessionEvent::Controls { .. } => {}
        }
    }

    fn render_log(&self, entry: &LogEntry) {
        if self.quiet {
            return;
        }
        let time = entry.timestamp.format("%H:%M:%S");
        let line = format!("[{}] {}", time, entry.message);
        // Route through the bar so log lines do not tear it
        let printed = match entry.severity {
            LogSeverity::Info => line.normal(),
            LogSeverity::Success => line.green(),
            LogSeverity::Error => line.red(),
        };
        match &self.bar {
            Some(bar) => bar.println(printed.to_string()),
            None => println!("{}", printed),
        }
    }

    fn render_progress(&mut self, progress: &FlashProgress) {
        if self.quiet || progress.bytes_total == 0 {
            return;
        }
        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(progress.bytes_total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                    .unwrap()
                    .progress_chars("=>-"),
            );
            bar
        });
        bar.set_length(progress.bytes_total);
        bar.set_position(progress.bytes_written);
    }

    /// Close out the progress bar at the end of an attempt.
    pub fn finish(&mut self, phase: Phase) {
        if let Some(bar) = self.bar.take() {
            match phase {
                Phase::Completed => bar.finish_with_message("done"),
                _ => bar.abandon_with_message("failed"),
            }
        }
    }
}
