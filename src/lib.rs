//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

#![deny(
    unreachable_pub,
    missing_docs,
    missing_abi,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]

//! # Lapis
//!
//! The pass-scheduling engine of a mid-level IR optimizer: a small IR, the
//! pass and analysis-cache infrastructure, the built-in passes, and the
//! pipelines that decide which passes run, in what order and how often.
//!
//! ```
//! # use lapis::ir::*;
//! # use lapis::pipeline::PipelineOptions;
//! let mut module = Module::new("example");
//! let mut b = module.define_function("main", Linkage::Public, FuncAttributes::default());
//! let entry = b.create_block("entry");
//!
//! b.switch_to(entry);
//! b.ret();
//!
//! let options = PipelineOptions::default();
//!
//! assert!(!lapis::run_diagnostics(&mut module, &options).unwrap());
//! assert_eq!(module.stage(), Stage::Canonical);
//!
//! lapis::run_optimizations(&mut module, &options).unwrap();
//! ```

pub mod analysis;
pub mod arena;
pub mod ir;
pub mod pass;
pub mod pipeline;
pub mod transforms;
pub mod utility;

#[cfg(feature = "dev-tools")]
pub mod cli;

use crate::ir::Module;
use crate::pass::PipelineError;
use crate::pipeline::{PassRegistry, PipelineOptions};

/// Runs the diagnostic pipeline with the built-in passes, see
/// [`pipeline::run_diagnostic_passes`].
pub fn run_diagnostics(module: &mut Module, options: &PipelineOptions) -> Result<bool, PipelineError> {
    pipeline::run_diagnostic_passes(module, options, &PassRegistry::with_builtins())
}

/// Runs the optimization pipeline with the built-in passes, see
/// [`pipeline::run_optimization_passes`].
pub fn run_optimizations(module: &mut Module, options: &PipelineOptions) -> Result<(), PipelineError> {
    pipeline::run_optimization_passes(module, options, &PassRegistry::with_builtins())
}
