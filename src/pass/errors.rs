//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::pass::{AnalysisKind, PassKind};
use thiserror::Error;

/// Errors produced by the pass infrastructure itself.
///
/// None of these are about the user's program, those are recorded as
/// [`Diagnostic`](crate::ir::Diagnostic)s. Every variant here means that the
/// pipeline invocation cannot continue: either the pipeline was wired
/// incorrectly, or a pass found the IR in a state it cannot trust.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The same analysis kind was registered twice into one cache.
    #[error("analysis `{0}` was registered more than once")]
    DuplicateAnalysis(AnalysisKind),

    /// An analysis was requested from a cache that it was never registered in.
    #[error("analysis `{0}` was requested but was never registered")]
    UnregisteredAnalysis(AnalysisKind),

    /// A pipeline builder asked for a transform that has no factory.
    #[error("pass `{0}` was scheduled but has no registered implementation")]
    UnregisteredPass(PassKind),

    /// An analysis could not be computed for the current state of the module.
    #[error("unable to construct analysis `{kind}`: {reason}")]
    AnalysisConstruction {
        /// The analysis that failed.
        kind: AnalysisKind,
        /// Why it failed.
        reason: String,
    },

    /// A pass detected that an internal invariant was violated.
    #[error("pass `{pass}` failed: {reason}")]
    PassInternal {
        /// The name of the pass (or analysis) that failed.
        pass: String,
        /// What went wrong.
        reason: String,
    },

    /// A module-scoped analysis was requested per-function, or the reverse.
    #[error("analysis `{kind}` was requested with the wrong scope")]
    AnalysisScopeMismatch {
        /// The analysis that was requested.
        kind: AnalysisKind,
    },

    /// The result registered under a kind is not of the requested type.
    #[error("analysis `{kind}` does not produce the requested result type")]
    AnalysisTypeMismatch {
        /// The analysis that was requested.
        kind: AnalysisKind,
    },

    /// An analysis transitively requested itself while it was being computed.
    #[error("analysis `{0}` depends on itself")]
    CyclicAnalysis(AnalysisKind),
}

/// The error type that pass and analysis bodies return.
///
/// The pass manager knows which pass is running, so bodies only need to say
/// what went wrong. Errors from the infrastructure (e.g. a failed analysis
/// request) are carried through unchanged.
#[derive(Debug, Error)]
pub enum PassError {
    /// An internal invariant of the pass was violated.
    #[error("{0}")]
    Internal(String),

    /// An analysis cannot be computed for the module in its current state.
    #[error("{0}")]
    Construction(String),

    /// An error raised by the infrastructure while the pass was running.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl PassError {
    /// Attributes the error to a transform pass.
    pub(crate) fn in_pass(self, pass: &str) -> PipelineError {
        match self {
            PassError::Internal(reason) | PassError::Construction(reason) => {
                PipelineError::PassInternal {
                    pass: pass.to_owned(),
                    reason,
                }
            }
            PassError::Pipeline(err) => err,
        }
    }

    /// Attributes the error to an analysis.
    pub(crate) fn in_analysis(self, kind: AnalysisKind) -> PipelineError {
        match self {
            PassError::Internal(reason) => PipelineError::PassInternal {
                pass: kind.to_string(),
                reason,
            },
            PassError::Construction(reason) => {
                PipelineError::AnalysisConstruction { kind, reason }
            }
            PassError::Pipeline(err) => err,
        }
    }
}
