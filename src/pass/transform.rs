//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::Module;
use crate::pass::{AnalysisCache, AnalysisKind, PassError, PreservedAnalyses};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

macro_rules! pass_kinds {
    ( $( $(#[$doc:meta])* $variant:ident $({ $($field:ident : $ty:ty),* })? => $name:expr ),* $(,)? ) => {
        /// Every transformation in the catalogue that pipelines can schedule.
        ///
        /// The scheduler never looks inside of a pass, it only deals in these
        /// names. Implementations are looked up in a
        /// [`PassRegistry`](crate::pipeline::PassRegistry).
        #[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
        pub enum PassKind {
            $( $(#[$doc])* $variant $({ $( #[allow(missing_docs)] $field: $ty ),* })?, )*
        }

        impl PassKind {
            /// Gets the stable, human-readable name of the pass.
            pub fn name(self) -> &'static str {
                match self {
                    $( PassKind::$variant $({ $($field),* })? => $name, )*
                }
            }
        }
    };
}

pass_kinds! {
    /// Inlines `transparent` functions, required for correctness.
    MandatoryInlining => "mandatory-inlining",
    /// Promotes captured boxes to by-value captures.
    CapturePromotion => "capture-promotion",
    /// Moves heap boxes that never escape onto the stack.
    AllocBoxToStack => "alloc-box-to-stack",
    /// Removes shadow copies of `inout` arguments.
    InOutDeshadowing => "inout-deshadowing",
    /// Folds code after calls to functions that never return.
    NoReturnFolding => "noreturn-folding",
    /// Checks that memory is initialized before use.
    DefiniteInitialization => "definite-init",
    /// Canonicalizes predictable loads and stores.
    PredictableMemoryOpt => "predictable-memopt",
    /// Constant propagation that reports overflow and similar problems.
    DiagnosticConstantPropagation => "diagnostic-constant-propagation",
    /// Reports and removes code that can never execute.
    DiagnoseUnreachable => "diagnose-unreachable",
    /// Emits diagnostics found through data-flow (e.g. missing returns).
    EmitDataFlowDiagnostics => "emit-dataflow-diagnostics",
    /// Splits every critical edge that does not come from a `condbr`.
    SplitNonCondBrCriticalEdges => "split-non-condbr-critical-edges",
    /// Control-flow graph simplification.
    SimplifyCfg => "simplify-cfg",
    /// Peephole instruction combining.
    Combine => "combine",
    /// Forwards copies of values to their uses.
    CopyForwarding => "copy-forwarding",
    /// Lowers aggregate copies into per-field operations.
    LowerAggregate => "lower-aggregate",
    /// Scalar replacement of aggregates.
    Sroa => "sroa",
    /// Promotes memory to SSA values.
    Mem2Reg => "mem2reg",
    /// Constant propagation for performance.
    PerformanceConstantPropagation => "performance-constant-propagation",
    /// Dead code elimination.
    Dce => "dce",
    /// Common subexpression elimination.
    Cse => "cse",
    /// Promotes loads/stores of globals.
    GlobalLoadStoreOpts => "global-load-store-opts",
    /// Retain/release code motion, optionally also hoisting releases.
    CodeMotion { hoist_releases: bool } => if hoist_releases { "code-motion-hoist-releases" } else { "code-motion" },
    /// The global reference-counting optimizer.
    GlobalArcOpts => "global-arc-opts",
    /// Converts dynamic dispatch into static dispatch.
    Devirtualization => "devirtualize",
    /// Specializes generic functions for their concrete uses.
    GenericSpecializer => "generic-specializer",
    /// Links in bodies of functions from other modules.
    Linker => "linker",
    /// The high-level inliner, leaves functions with semantics alone.
    EarlyInliner => "early-inline",
    /// The mid-level inliner, leaves global initializers alone.
    PerfInliner => "perf-inline",
    /// The low-level inliner, inlines anything it can.
    LateInliner => "late-inline",
    /// Rotates loops into do-while form.
    LoopRotate => "loop-rotate",
    /// Array bounds-check optimization.
    ArrayBoundsCheckOpts => "abcopt",
    /// Copy-on-write array optimizations.
    CowArrayOpts => "cow-array-opts",
    /// Specializes loops over arrays.
    SpecializedArrayOpts => "array-specialize",
    /// Loop-invariant code motion.
    Licm => "licm",
    /// Removes private functions that are never called.
    DeadFunctionElimination => "dead-function-elimination",
    /// Removes objects that are allocated but never observed.
    DeadObjectElimination => "dead-object-elimination",
    /// Global variable optimizations that are safe to hoist.
    GlobalOpt => "global-opt",
    /// Propagates constant captures into closures.
    CapturePropagation => "capture-propagation",
    /// Specializes functions for the closures passed to them.
    ClosureSpecializer => "closure-specialize",
    /// Inserts inline caches for virtual calls.
    InlineCaches => "inline-caches",
    /// Optimizes function signatures (e.g. dead arguments).
    FunctionSignatureOpts => "function-signature-opts",
    /// Reports instruction counts, never mutates IR.
    InstCount => "inst-count",
    /// Writes out the CFG of every function, never mutates IR.
    CfgPrinter => "cfg-printer",
    /// Checks the module for internal consistency, never mutates IR.
    Verify => "verify",
}

impl PassKind {
    /// Every pass kind in the catalogue.
    pub const ALL: &'static [PassKind] = &[
        PassKind::MandatoryInlining,
        PassKind::CapturePromotion,
        PassKind::AllocBoxToStack,
        PassKind::InOutDeshadowing,
        PassKind::NoReturnFolding,
        PassKind::DefiniteInitialization,
        PassKind::PredictableMemoryOpt,
        PassKind::DiagnosticConstantPropagation,
        PassKind::DiagnoseUnreachable,
        PassKind::EmitDataFlowDiagnostics,
        PassKind::SplitNonCondBrCriticalEdges,
        PassKind::SimplifyCfg,
        PassKind::Combine,
        PassKind::CopyForwarding,
        PassKind::LowerAggregate,
        PassKind::Sroa,
        PassKind::Mem2Reg,
        PassKind::PerformanceConstantPropagation,
        PassKind::Dce,
        PassKind::Cse,
        PassKind::GlobalLoadStoreOpts,
        PassKind::CodeMotion {
            hoist_releases: false,
        },
        PassKind::CodeMotion {
            hoist_releases: true,
        },
        PassKind::GlobalArcOpts,
        PassKind::Devirtualization,
        PassKind::GenericSpecializer,
        PassKind::Linker,
        PassKind::EarlyInliner,
        PassKind::PerfInliner,
        PassKind::LateInliner,
        PassKind::LoopRotate,
        PassKind::ArrayBoundsCheckOpts,
        PassKind::CowArrayOpts,
        PassKind::SpecializedArrayOpts,
        PassKind::Licm,
        PassKind::DeadFunctionElimination,
        PassKind::DeadObjectElimination,
        PassKind::GlobalOpt,
        PassKind::CapturePropagation,
        PassKind::ClosureSpecializer,
        PassKind::InlineCaches,
        PassKind::FunctionSignatureOpts,
        PassKind::InstCount,
        PassKind::CfgPrinter,
        PassKind::Verify,
    ];

    /// Looks up a pass kind by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<PassKind> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl Display for PassKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Models a pass that possibly performs a transformation over an entire module.
///
/// While the pass may not actually modify the IR, it has the ability to, and
/// needs to declare what it left intact (if anything) through
/// [`Self::preserved_analyses`].
pub trait ModuleTransformPass {
    /// Which entry of the catalogue this pass implements.
    fn kind(&self) -> PassKind;

    /// The name used for the pass in logs and errors.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Declares which analyses survive the pass. This is queried right after
    /// every run, every analysis it does not mention is invalidated.
    ///
    /// The default invalidates everything, which is always correct.
    fn preserved_analyses(&self) -> PreservedAnalyses {
        PreservedAnalyses::none()
    }

    /// Performs the transformation over a given module.
    ///
    /// Finding nothing to do is a success. Errors are reserved for internal
    /// invariant violations, they abort the whole pipeline.
    fn run(&mut self, module: &mut Module, am: &AnalysisCache) -> Result<(), PassError>;
}

/// A single entry in a [`PassManager`](crate::pass::PassManager)'s schedule.
pub enum ScheduledPass {
    /// A pass that may mutate the module.
    Transform(Box<dyn ModuleTransformPass>),
    /// Forces an analysis to be computed (and cached) at this point.
    Analysis(AnalysisKind),
}

impl ScheduledPass {
    /// Gets the name of the scheduled pass.
    pub fn name(&self) -> &'static str {
        match self {
            ScheduledPass::Transform(pass) => pass.name(),
            ScheduledPass::Analysis(kind) => kind.name(),
        }
    }
}

impl Debug for ScheduledPass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScheduledPass::Transform(pass) => write!(f, "Transform({})", pass.name()),
            ScheduledPass::Analysis(kind) => write!(f, "Analysis({kind})"),
        }
    }
}
