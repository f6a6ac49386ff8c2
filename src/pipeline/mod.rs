//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The top-level pipelines: the mandatory diagnostic pipeline and the
//! performance optimization pipeline.
//!
//! Both drivers build their own [`PassManager`], register the whole
//! analysis catalogue into it, schedule passes through the builders in
//! [`builders`](self) and throw the manager away when they return. Nothing
//! persists between invocations except the module itself.

mod builders;
mod options;
mod registry;

pub use builders::*;
pub use options::*;
pub use registry::*;

use crate::ir::{Module, Stage};
use crate::pass::{PassKind, PassManager, PipelineError};

/// Runs the mandatory diagnostic passes over a module, and returns whether
/// any errors were diagnosed.
///
/// Modules that are already [`Stage::Canonical`] are left alone. Otherwise,
/// the module is canonical once this returns successfully, *even if errors
/// were diagnosed*: callers need to check the return value, not the stage.
///
/// In debug-serialization mode only mandatory inlining runs, and the module
/// stays [`Stage::Raw`].
pub fn run_diagnostic_passes(
    module: &mut Module,
    options: &PipelineOptions,
    registry: &PassRegistry,
) -> Result<bool, PipelineError> {
    // if the module is already canonical, the diagnostics have already run
    if module.stage() == Stage::Canonical {
        log::debug!("`{}` is already canonical, skipping diagnostics", module.name());

        return Ok(false);
    }

    let mut pm = PassManager::new();

    register_analysis_passes(&mut pm, registry)?;
    add_passes(&mut pm, registry, &[PassKind::MandatoryInlining])?;

    if options.debug_serialization {
        pm.run(module)?;

        return Ok(module.diagnostics().had_error());
    }

    add_diagnostic_passes(&mut pm, registry)?;
    pm.run(module)?;

    module.mark_canonical();

    Ok(module.diagnostics().had_error())
}

/// Runs the performance optimization pipeline over a module.
///
/// The module is expected to have been through [`run_diagnostic_passes`]
/// already, this is not checked.
///
/// # Panics
/// In debug builds, the module is verified once the pipeline is done, and
/// this panics if it is malformed.
pub fn run_optimization_passes(
    module: &mut Module,
    options: &PipelineOptions,
    registry: &PassRegistry,
) -> Result<(), PipelineError> {
    if options.debug_serialization {
        let mut pm = PassManager::new();

        register_analysis_passes(&mut pm, registry)?;
        add_passes(&mut pm, registry, &[PassKind::Linker])?;

        return pm.run(module);
    }

    let mut pm = PassManager::with_segment("PreSpecialize");

    register_analysis_passes(&mut pm, registry)?;

    // start by specializing generics and by linking in external definitions
    add_passes(&mut pm, registry, &[PassKind::Linker, PassKind::GenericSpecializer])?;
    pm.run(module)?;

    pm.reset_and_remove_transformations("HighLevel");
    add_ssa_passes(&mut pm, registry, OptimizationLevel::HighLevel)?;
    pm.run_one_iteration(module)?;
    pm.run_one_iteration(module)?;

    pm.reset_and_remove_transformations("EarlyLoopOpt");
    add_high_level_loop_opt_passes(&mut pm, registry)?;
    pm.run_one_iteration(module)?;

    pm.reset_and_remove_transformations("MidLevel");
    add_ssa_passes(&mut pm, registry, OptimizationLevel::MidLevel)?;
    pm.run_one_iteration(module)?;
    pm.run_one_iteration(module)?;

    pm.reset_and_remove_transformations("Lower");
    add_passes(
        &mut pm,
        registry,
        &[
            PassKind::DeadFunctionElimination,
            PassKind::DeadObjectElimination,
            // global initializers may only be inlined after this
            PassKind::GlobalOpt,
            PassKind::CapturePropagation,
            PassKind::ClosureSpecializer,
            PassKind::Devirtualization,
            PassKind::InlineCaches,
        ],
    )?;

    if options.enable_function_signature_opts {
        add_passes(&mut pm, registry, &[PassKind::FunctionSignatureOpts])?;
    }

    pm.run(module)?;

    pm.reset_and_remove_transformations("LowLevel");
    add_ssa_passes(&mut pm, registry, OptimizationLevel::LowLevel)?;
    pm.run_one_iteration(module)?;

    pm.reset_and_remove_transformations("LateLoopOpt");
    add_low_level_loop_opt_passes(&mut pm, registry)?;
    add_passes(&mut pm, registry, &[PassKind::DeadFunctionElimination])?;
    pm.run_one_iteration(module)?;

    if options.print_instruction_counts {
        let mut printer = PassManager::new();

        add_passes(&mut printer, registry, &[PassKind::InstCount])?;
        printer.run_one_iteration(module)?;
    }

    if options.enable_cfg_view {
        pm.reset_and_remove_transformations("");
        add_passes(&mut pm, registry, &[PassKind::CfgPrinter])?;
        pm.run_one_iteration(module)?;
    }

    #[cfg(debug_assertions)]
    crate::transforms::verify_module_panic(module);

    Ok(())
}
