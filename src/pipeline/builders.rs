//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The pipeline builders. These only decide *what* runs and in which
//! order, they never run anything themselves.

use crate::pass::{AnalysisKind, PassKind, PassManager, PipelineError};
use crate::pipeline::PassRegistry;

/// How aggressive an SSA optimization bundle is.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum OptimizationLevel {
    /// Semantic calls and global initializers are kept intact.
    HighLevel,
    /// Semantic calls are inlined, global initializers are kept intact.
    MidLevel,
    /// Everything is fair game, releases are hoisted.
    LowLevel,
}

impl OptimizationLevel {
    fn inliner(self) -> PassKind {
        match self {
            OptimizationLevel::HighLevel => PassKind::EarlyInliner,
            OptimizationLevel::MidLevel => PassKind::PerfInliner,
            OptimizationLevel::LowLevel => PassKind::LateInliner,
        }
    }
}

/// Appends an instance of each of `kinds` to the current segment, in order.
pub fn add_passes(
    pm: &mut PassManager,
    registry: &PassRegistry,
    kinds: &[PassKind],
) -> Result<(), PipelineError> {
    for &kind in kinds {
        pm.add_boxed(registry.create(kind)?);
    }

    Ok(())
}

/// Registers an instance of every analysis kind into the manager.
pub fn register_analysis_passes(
    pm: &mut PassManager,
    registry: &PassRegistry,
) -> Result<(), PipelineError> {
    for kind in AnalysisKind::ALL {
        pm.register_analysis(registry.create_analysis(kind)?)?;
    }

    Ok(())
}

/// Appends the correctness diagnostics that follow mandatory inlining.
pub fn add_diagnostic_passes(pm: &mut PassManager, registry: &PassRegistry) -> Result<(), PipelineError> {
    add_passes(
        pm,
        registry,
        &[
            PassKind::CapturePromotion,
            PassKind::AllocBoxToStack,
            PassKind::InOutDeshadowing,
            PassKind::NoReturnFolding,
            PassKind::DefiniteInitialization,
            PassKind::PredictableMemoryOpt,
            PassKind::DiagnosticConstantPropagation,
            PassKind::DiagnoseUnreachable,
            PassKind::EmitDataFlowDiagnostics,
            // canonical IR requires every non-condbr critical edge to be split
            PassKind::SplitNonCondBrCriticalEdges,
        ],
    )
}

/// Appends a CFG simplification, a combine (which jump threading can expose
/// opportunities for), and another CFG simplification.
pub fn add_simplify_cfg_combine(pm: &mut PassManager, registry: &PassRegistry) -> Result<(), PipelineError> {
    add_passes(
        pm,
        registry,
        &[PassKind::SimplifyCfg, PassKind::Combine, PassKind::SimplifyCfg],
    )
}

/// Appends the high-level loop optimizations and the cleanups around them.
pub fn add_high_level_loop_opt_passes(
    pm: &mut PassManager,
    registry: &PassRegistry,
) -> Result<(), PipelineError> {
    // classic SSA cleanup first
    add_passes(
        pm,
        registry,
        &[
            PassKind::LowerAggregate,
            PassKind::Combine,
            PassKind::Sroa,
            PassKind::Mem2Reg,
            PassKind::Dce,
            PassKind::Combine,
        ],
    )?;
    add_simplify_cfg_combine(pm, registry)?;
    add_passes(
        pm,
        registry,
        &[
            PassKind::LoopRotate,
            PassKind::Dce,
            PassKind::Cse,
            PassKind::Combine,
            PassKind::SimplifyCfg,
            PassKind::ArrayBoundsCheckOpts,
            PassKind::Dce,
            PassKind::CowArrayOpts,
            PassKind::Dce,
            PassKind::SpecializedArrayOpts,
        ],
    )
}

/// Appends the low-level loop optimizations and the cleanups after them.
pub fn add_low_level_loop_opt_passes(
    pm: &mut PassManager,
    registry: &PassRegistry,
) -> Result<(), PipelineError> {
    add_passes(
        pm,
        registry,
        &[
            PassKind::Licm,
            PassKind::Dce,
            PassKind::Cse,
            PassKind::Combine,
            PassKind::SimplifyCfg,
        ],
    )
}

/// Appends the SSA optimization bundle for a given tier.
///
/// The tiers only differ in which inliner runs, and in whether the final
/// retain/release code motion hoists releases (only at [`OptimizationLevel::LowLevel`]).
pub fn add_ssa_passes(
    pm: &mut PassManager,
    registry: &PassRegistry,
    level: OptimizationLevel,
) -> Result<(), PipelineError> {
    add_simplify_cfg_combine(pm, registry)?;
    add_passes(
        pm,
        registry,
        &[
            PassKind::AllocBoxToStack,
            PassKind::CopyForwarding,
            PassKind::LowerAggregate,
            PassKind::Combine,
            PassKind::Sroa,
            PassKind::Mem2Reg,
            PassKind::PerformanceConstantPropagation,
            PassKind::Dce,
            PassKind::Cse,
            PassKind::Combine,
        ],
    )?;
    add_simplify_cfg_combine(pm, registry)?;
    add_passes(
        pm,
        registry,
        &[
            PassKind::GlobalLoadStoreOpts,
            PassKind::CodeMotion {
                hoist_releases: false,
            },
            PassKind::GlobalArcOpts,
            PassKind::Devirtualization,
            PassKind::GenericSpecializer,
            PassKind::Linker,
            level.inliner(),
            PassKind::SimplifyCfg,
            PassKind::CodeMotion {
                hoist_releases: level == OptimizationLevel::LowLevel,
            },
            PassKind::GlobalArcOpts,
        ],
    )
}
