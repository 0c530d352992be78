//! Operator-facing output and process exit, injectable for tests.

/// Sink for operator-facing messages plus the process exit hook.
pub trait Runtime {
    fn log(&mut self, message: &str);
    fn error(&mut self, message: &str);
    /// Terminate with `code`. The production runtime never returns.
    fn exit(&mut self, code: i32);
}

/// Writes to stdout/stderr and exits the real process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRuntime;

impl Runtime for ProcessRuntime {
    fn log(&mut self, message: &str) {
        println!("{message}");
    }

    fn error(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

/// Captures messages and the requested exit code instead of exiting.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default, Clone)]
pub struct RecordingRuntime {
    pub logs: Vec<String>,
    pub errors: Vec<String>,
    pub exit_code: Option<i32>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// All error lines joined by newlines.
    pub fn error_text(&self) -> String {
        self.errors.join("\n")
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Runtime for RecordingRuntime {
    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}
