//!
//! Non-fatal security-best-practice warnings.
//!
//! An advisory records a legal but discouraged setting (for example an insecure
//! cookie over https). Advisories never change a resolved value and never abort
//! resolution. At most one advisory is surfaced per validation call: the first
//! one raised in resolution order wins and later ones are only logged at debug
//! level.
//!

use std::fmt;

/// A warning about a legal but discouraged configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    field: String,
    message: String,
}

impl Advisory {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Dotted path of the field that raised the advisory.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collects advisories for one validation call, keeping the first.
#[derive(Debug, Default)]
pub(crate) struct AdvisoryChannel {
    first: Option<Advisory>,
    suppressed: usize,
}

impl AdvisoryChannel {
    pub fn offer(&mut self, advisory: Advisory) {
        if self.first.is_none() {
            self.first = Some(advisory);
            return;
        }
        self.suppressed += 1;
        tracing::debug!(
            field = %advisory.field,
            suppressed = self.suppressed,
            "Advisory not surfaced, one was already raised: {}",
            advisory.message
        );
    }

    #[cfg(test)]
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn into_first(self) -> Option<Advisory> {
        self.first
    }
}
