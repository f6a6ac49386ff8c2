//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Defines the transform passes that ship with the crate.
//!
//! These are the passes that can (potentially) modify the IR, and don't
//! actually logically yield a result.
//!
//! Some of these "transforms" are not actually transformations (e.g.
//! the verify pass and the printers manipulate no IR), but they are
//! scheduled the same way. Kinds of the catalogue that need a richer IR
//! than this crate models are filled in by [`OpaquePass`].

mod critical;
mod dfe;
mod inliner;
mod opaque;
mod printers;
mod unreachable;
mod verify;

pub use critical::*;
pub use dfe::*;
pub use inliner::*;
pub use opaque::*;
pub use printers::*;
pub use unreachable::*;
pub use verify::*;

use crate::pass::{ModuleTransformPass, PassKind};

/// Creates the built-in implementation of a transform kind. Reporting
/// passes write to [`std::io::stderr`].
pub fn builtin_transform(kind: PassKind) -> Box<dyn ModuleTransformPass> {
    match kind {
        PassKind::MandatoryInlining => Box::new(InlinerPass::mandatory()),
        PassKind::EarlyInliner => Box::new(InlinerPass::early()),
        PassKind::PerfInliner => Box::new(InlinerPass::performance()),
        PassKind::LateInliner => Box::new(InlinerPass::late()),
        PassKind::DiagnoseUnreachable => Box::new(DiagnoseUnreachablePass::default()),
        PassKind::SplitNonCondBrCriticalEdges => Box::new(SplitCriticalEdgesPass::default()),
        PassKind::SimplifyCfg => Box::new(SimplifyCfgPass::default()),
        PassKind::DeadFunctionElimination => Box::new(DeadFunctionEliminationPass::default()),
        PassKind::InstCount => Box::new(InstCountPass::stderr()),
        PassKind::CfgPrinter => Box::new(CfgPrinterPass::stderr()),
        PassKind::Verify => Box::new(VerifyModulePass),
        _ => Box::new(OpaquePass::new(kind)),
    }
}
