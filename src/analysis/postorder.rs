//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, Body, Function, Module};
use crate::pass::{AnalysisCache, AnalysisKind, FunctionAnalysis, PassError};
use crate::utility::{SaHashMap, SaHashSet};

/// A postorder of the blocks reachable from the entry of a function.
///
/// Blocks that are unreachable from the entry are simply not part of the
/// order, so this doubles as a reachability query.
#[derive(Debug, Default)]
pub struct PostOrder {
    order: Vec<Block>,
    numbers: SaHashMap<Block, usize>,
}

impl PostOrder {
    /// Directly computes a postorder over `body`.
    pub fn compute(body: &Body) -> Self {
        let entry = match body.entry() {
            Some(entry) => entry,
            None => return Self::default(),
        };

        let mut order = Vec::with_capacity(body.len());
        let mut numbers = SaHashMap::default();
        let mut visited = SaHashSet::default();

        // each stack entry is a block and the index of the next successor to visit
        let mut stack = vec![(entry, 0usize)];

        visited.insert(entry);

        while let Some((bb, next)) = stack.pop() {
            let successors = body.successors(bb);

            match successors.get(next).copied() {
                Some(succ) => {
                    stack.push((bb, next + 1));

                    if body.contains(succ) && visited.insert(succ) {
                        stack.push((succ, 0));
                    }
                }
                None => {
                    numbers.insert(bb, order.len());
                    order.push(bb);
                }
            }
        }

        Self { order, numbers }
    }

    /// Gets the reachable blocks in postorder. The entry is always last.
    pub fn postorder(&self) -> &[Block] {
        &self.order
    }

    /// Iterates over the reachable blocks in reverse postorder.
    pub fn reverse_postorder(&self) -> impl Iterator<Item = Block> + '_ {
        self.order.iter().rev().copied()
    }

    /// Gets the postorder number of `bb`, if it is reachable.
    pub fn number(&self, bb: Block) -> Option<usize> {
        self.numbers.get(&bb).copied()
    }

    /// Checks if `bb` is reachable from the entry block.
    pub fn is_reachable(&self, bb: Block) -> bool {
        self.numbers.contains_key(&bb)
    }

    /// Gets the number of reachable blocks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Checks if no blocks are reachable, i.e. the body is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Wrapper analysis that computes a [`PostOrder`] per function.
pub struct PostOrderAnalysis;

impl FunctionAnalysis for PostOrderAnalysis {
    const KIND: AnalysisKind = AnalysisKind::PostOrder;
    type Result = PostOrder;

    fn run(&mut self, _: &Module, func: &Function, _: &AnalysisCache) -> Result<PostOrder, PassError> {
        let body = func.body().ok_or_else(|| {
            PassError::Construction(format!("function `{}` has no body", func.name()))
        })?;

        Ok(PostOrder::compute(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FuncAttributes, Linkage};

    #[test]
    fn diamond_postorder() {
        let mut module = Module::new("m");
        let mut b = module.define_function("f", Linkage::Public, FuncAttributes::default());
        let entry = b.create_block("entry");
        let left = b.create_block("left");
        let right = b.create_block("right");
        let exit = b.create_block("exit");
        let dead = b.create_block("dead");

        b.switch_to(entry);
        b.condbr(left, right);
        b.switch_to(left);
        b.br(exit);
        b.switch_to(right);
        b.br(exit);
        b.switch_to(exit);
        b.ret();
        b.switch_to(dead);
        b.br(exit);

        let f = b.func();
        let po = PostOrder::compute(module.function(f).body().unwrap());

        assert_eq!(po.postorder(), &[exit, left, right, entry]);
        assert_eq!(po.reverse_postorder().next(), Some(entry));
        assert!(!po.is_reachable(dead));
        assert_eq!(po.number(entry), Some(3));
        assert_eq!(po.len(), 4);
    }

    #[test]
    fn loops_terminate() {
        let mut module = Module::new("m");
        let mut b = module.define_function("f", Linkage::Public, FuncAttributes::default());
        let entry = b.create_block("entry");
        let header = b.create_block("header");
        let exit = b.create_block("exit");

        b.switch_to(entry);
        b.br(header);
        b.switch_to(header);
        b.condbr(header, exit);
        b.switch_to(exit);
        b.ret();

        let f = b.func();
        let po = PostOrder::compute(module.function(f).body().unwrap());

        assert_eq!(po.postorder(), &[exit, header, entry]);
    }
}
