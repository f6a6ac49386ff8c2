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
use smallvec::SmallVec;

/// Helper type for building the body of a function.
///
/// Instructions are appended to the block most recently passed to
/// [`Self::switch_to`].
///
/// ```
/// # use lapis::ir::*;
/// let mut module = Module::new("example");
/// let mut b = module.define_function("main", Linkage::Public, FuncAttributes::default());
/// let entry = b.create_block("entry");
///
/// b.switch_to(entry);
/// b.call("print");
/// b.ret();
/// ```
#[derive(Debug)]
pub struct FuncBuilder<'m> {
    module: &'m mut Module,
    func: Func,
    current: Option<Block>,
}

impl<'m> FuncBuilder<'m> {
    pub(in crate::ir) fn new(module: &'m mut Module, func: Func) -> Self {
        module.function_mut(func).define();

        Self {
            module,
            func,
            current: None,
        }
    }

    /// Gets the function being built.
    pub fn func(&self) -> Func {
        self.func
    }

    /// Creates a new block at the end of the function.
    pub fn create_block(&mut self, name: &str) -> Block {
        self.body().create_block(name)
    }

    /// Makes `bb` the block that instructions are appended to.
    pub fn switch_to(&mut self, bb: Block) {
        self.current = Some(bb);
    }

    /// Appends an arbitrary instruction to the current block.
    pub fn append(&mut self, inst: InstData) {
        let bb = self
            .current
            .expect("must call `switch_to` before appending instructions");

        self.body().block_mut(bb).insts_mut().push(inst);
    }

    /// Appends an opaque computation.
    pub fn compute(&mut self, opcode: &str) {
        self.append(InstData::Compute(opcode.to_owned()))
    }

    /// Appends a call to the function named `callee`.
    pub fn call(&mut self, callee: &str) {
        self.append(InstData::Call(callee.to_owned()))
    }

    /// Appends `br target`.
    pub fn br(&mut self, target: Block) {
        self.append(InstData::Br(target))
    }

    /// Appends `condbr if_true, if_false`.
    pub fn condbr(&mut self, if_true: Block, if_false: Block) {
        self.append(InstData::CondBr(if_true, if_false))
    }

    /// Appends a switch over `targets`.
    pub fn switch(&mut self, targets: &[Block]) {
        self.append(InstData::Switch(SmallVec::from_slice(targets)))
    }

    /// Appends `ret`.
    pub fn ret(&mut self) {
        self.append(InstData::Ret)
    }

    /// Appends `unreachable`.
    pub fn unreachable(&mut self) {
        self.append(InstData::Unreachable)
    }

    fn body(&mut self) -> &mut Body {
        self.module.function_mut(self.func).define()
    }
}
