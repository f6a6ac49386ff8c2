//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// How severe a user-facing diagnostic is.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Severity {
    /// Extra information attached to another diagnostic.
    Note,
    /// Something suspicious, but the program is still valid.
    Warning,
    /// The program is invalid.
    Error,
}

/// A single user-facing finding, recorded by a diagnostic pass.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    /// How severe the finding is.
    pub severity: Severity,
    /// The function the finding is about, if any.
    pub function: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        match &self.function {
            Some(func) => write!(f, "{severity}: in `{func}`: {}", self.message),
            None => write!(f, "{severity}: {}", self.message),
        }
    }
}

/// Collects the diagnostics produced while processing a module.
///
/// Problems with the user's program are data, not control flow: passes
/// record them here and keep going, and the diagnostic pipeline only reports
/// whether any of them was an error.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct DiagnosticContext {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticContext {
    /// Records a diagnostic.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        log::debug!("recorded diagnostic `{diagnostic}`");

        self.diagnostics.push(diagnostic);
    }

    /// Shorthand for emitting a warning about a function.
    pub fn warn(&mut self, function: &str, message: impl Into<String>) {
        self.emit(Diagnostic {
            severity: Severity::Warning,
            function: Some(function.to_owned()),
            message: message.into(),
        })
    }

    /// Shorthand for emitting an error about a function.
    pub fn error(&mut self, function: &str, message: impl Into<String>) {
        self.emit(Diagnostic {
            severity: Severity::Error,
            function: Some(function.to_owned()),
            message: message.into(),
        })
    }

    /// Checks if any recorded diagnostic was an error.
    pub fn had_error(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Gets every recorded diagnostic, in the order they were emitted.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Counts the diagnostics with a given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_not_errors() {
        let mut ctx = DiagnosticContext::default();

        ctx.warn("f", "will never be executed");

        assert!(!ctx.had_error());
        assert_eq!(ctx.count(Severity::Warning), 1);

        ctx.error("f", "variable used before being initialized");

        assert!(ctx.had_error());
        assert_eq!(ctx.diagnostics().len(), 2);
    }

    #[test]
    fn display_includes_function() {
        let d = Diagnostic {
            severity: Severity::Warning,
            function: Some("main".into()),
            message: "will never be executed".into(),
        };

        assert_eq!(
            d.to_string(),
            "warning: in `main`: will never be executed"
        );
    }
}
