use tracing::debug;

use super::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: Error,
}

/// Diagnostics emitted while checking, in emission order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    muted: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics {
            entries: vec![],
            muted: 0,
        }
    }

    pub fn report(&mut self, error: Error) {
        self.push(Severity::Error, error);
    }

    pub fn warn(&mut self, error: Error) {
        self.push(Severity::Warning, error);
    }

    fn push(&mut self, severity: Severity, error: Error) {
        if error.is_already_reported() {
            return;
        }
        if self.muted > 0 {
            debug!("suppressed while probing: {}", error);
            return;
        }
        self.entries.push(Diagnostic { severity, error });
    }

    pub fn mute(&mut self) {
        self.muted += 1;
    }

    pub fn unmute(&mut self) {
        self.muted = self.muted.saturating_sub(1);
    }

    pub fn is_muted(&self) -> bool {
        self.muted > 0
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn error_names(&self) -> Vec<String> {
        self.errors().map(|e| e.get_error_name().to_string()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
