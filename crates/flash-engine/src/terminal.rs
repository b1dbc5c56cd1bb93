//! Terminal sink the engine writes its own output into

/// Sink for engine terminal output.
///
/// Engines narrate their work (sync attempts, stub upload, block counts)
/// through this sink; the session bridges it into the attempt log.
pub trait TerminalSink: Send + Sync {
    /// Clear the terminal.
    fn clean(&self);

    /// Write a full line.
    fn write_line(&self, line: &str);

    /// Write a raw chunk without a trailing newline.
    fn write(&self, text: &str);
}

/// Terminal sink that discards everything.
#[derive(Debug, Default)]
pub struct NullTerminal;

impl TerminalSink for NullTerminal {
    fn clean(&self) {}

    fn write_line(&self, line: &str) {
        tracing::trace!(target: "engine_terminal", "{}", line);
    }

    fn write(&self, text: &str) {
        tracing::trace!(target: "engine_terminal", "{}", text);
    }
}
