//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::*;
use crate::pass::*;
use thiserror::Error;

/// Every problem the verifier found in a module.
#[derive(Debug, Error)]
#[error("module `{module}` is malformed: {}", .errors.join("; "))]
pub struct VerifierError {
    /// The name of the module that was verified.
    pub module: String,
    /// One message per problem, in the order they were found.
    pub errors: Vec<String>,
}

/// An IR validity verification pass.
///
/// This scans the entire module, and does nothing if the module is valid. If
/// the module isn't valid, the pass fails with an internal error.
pub struct VerifyModulePass;

impl ModuleTransformPass for VerifyModulePass {
    fn kind(&self) -> PassKind {
        PassKind::Verify
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        PreservedAnalyses::all()
    }

    fn run(&mut self, module: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        verify_module(module).map_err(|err| PassError::Internal(err.to_string()))
    }
}

/// Verifies that an entire module is structurally valid.
///
/// This checks that every defined function has at least one block, that
/// every block ends in exactly one terminator, that every branch targets a
/// live block of the same function, and that every call names a function
/// of the module.
pub fn verify_module(module: &Module) -> Result<(), VerifierError> {
    let mut verifier = Verifier {
        module,
        errors: Vec::default(),
    };

    for func in module.functions() {
        verifier.visit_func(module.function(func));
    }

    if verifier.errors.is_empty() {
        Ok(())
    } else {
        Err(VerifierError {
            module: module.name().to_owned(),
            errors: verifier.errors,
        })
    }
}

/// This is [`verify_module`], except that it logs any errors and then
/// panics on failure.
pub fn verify_module_panic(module: &Module) {
    if let Err(e) = verify_module(module) {
        for error in e.errors.iter() {
            log::error!("{error}");
        }

        panic!("{e}");
    }
}

macro_rules! verify_assert {
    ($self:expr, $cond:expr, $($explanation:tt)+) => {
        if !($cond) {
            $self.errors.push(format!($($explanation)+));
        }
    };
}

struct Verifier<'m> {
    module: &'m Module,
    errors: Vec<String>,
}

impl<'m> Verifier<'m> {
    fn visit_func(&mut self, func: &Function) {
        let body = match func.body() {
            Some(body) => body,
            None => return,
        };

        verify_assert!(
            self,
            !body.is_empty(),
            "function `{}` is defined but has no blocks",
            func.name()
        );

        for bb in body.blocks() {
            self.visit_block(func, body, body.block(bb));
        }
    }

    fn visit_block(&mut self, func: &Function, body: &Body, block: &BlockData) {
        let insts = block.insts();
        let (name, bb) = (func.name(), block.name());

        verify_assert!(
            self,
            insts.last().map_or(false, InstData::is_terminator),
            "block `{bb}` in `{name}` does not end in a terminator"
        );

        for (i, inst) in insts.iter().enumerate() {
            verify_assert!(
                self,
                !inst.is_terminator() || i + 1 == insts.len(),
                "block `{bb}` in `{name}` has a terminator before its end"
            );

            for target in inst.successors() {
                verify_assert!(
                    self,
                    body.contains(target),
                    "branch in `{name}`:`{bb}` targets a block that does not exist"
                );
            }

            if let Some(callee) = inst.callee() {
                verify_assert!(
                    self,
                    self.module.find_function_by_name(callee).is_some(),
                    "call in `{name}`:`{bb}` to unknown function `{callee}`"
                );
            }
        }
    }
}
