//! Diagnostic output channels.

use std::sync::Mutex;

/// The channels the transformer reports on.
///
/// `log` carries generated code when `debug` is on, `debug` carries mode
/// information, `error` carries compiler errors with their source frame.
pub trait Console: Send + Sync {
    fn log(&self, message: &str);
    fn debug(&self, message: &str);
    fn error(&self, message: &str);
}

/// Writes `log` and `debug` to stdout and `error` to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn log(&self, message: &str) {
        println!("{}", message);
    }

    fn debug(&self, message: &str) {
        println!("{}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Which channel a captured line went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Log,
    Debug,
    Error,
}

/// Records every line in memory.
#[derive(Debug, Default)]
pub struct CapturedConsole {
    lines: Mutex<Vec<(Channel, String)>>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured lines in order.
    pub fn lines(&self) -> Vec<(Channel, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Returns the lines sent to one channel.
    pub fn channel(&self, channel: Channel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, line)| line)
            .collect()
    }

    fn push(&self, channel: Channel, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((channel, message.to_string()));
        }
    }
}

impl Console for CapturedConsole {
    fn log(&self, message: &str) {
        self.push(Channel::Log, message);
    }

    fn debug(&self, message: &str) {
        self.push(Channel::Debug, message);
    }

    fn error(&self, message: &str) {
        self.push(Channel::Error, message);
    }
}
