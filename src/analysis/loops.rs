//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{DominanceAnalysis, DominatorTree};
use crate::ir::{Block, Body, Function, Module};
use crate::pass::{AnalysisCache, AnalysisKind, FunctionAnalysis, PassError};
use crate::utility::SaHashSet;
use smallvec::SmallVec;

/// A single natural loop.
#[derive(Debug)]
pub struct Loop {
    header: Block,
    latches: SmallVec<[Block; 2]>,
    blocks: SaHashSet<Block>,
}

impl Loop {
    /// Gets the loop header, the only block of the loop that is entered
    /// from outside of it.
    pub fn header(&self) -> Block {
        self.header
    }

    /// Gets every block with a back edge to the header.
    pub fn latches(&self) -> &[Block] {
        &self.latches
    }

    /// Checks if `bb` is part of the loop body (the header included).
    pub fn contains(&self, bb: Block) -> bool {
        self.blocks.contains(&bb)
    }

    /// Gets the number of blocks in the loop.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Loops always contain at least their header.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Models the natural loops of a function.
///
/// A loop is found for every back edge, i.e. every edge `latch -> header`
/// where `header` dominates `latch`. Back edges to the same header are
/// merged into a single loop.
#[derive(Debug, Default)]
pub struct LoopInfo {
    loops: Vec<Loop>,
}

impl LoopInfo {
    /// Computes loop information from a body and its dominator tree.
    pub fn compute(body: &Body, domtree: &DominatorTree) -> Self {
        let preds = body.predecessors();
        let mut loops: Vec<Loop> = Vec::default();

        for latch in body.blocks().filter(|&bb| domtree.is_reachable(bb)) {
            for header in body.successors(latch) {
                if !domtree.dominates(latch, header) {
                    continue;
                }

                let index = match loops.iter().position(|l| l.header == header) {
                    Some(index) => index,
                    None => {
                        loops.push(Loop {
                            header,
                            latches: SmallVec::default(),
                            blocks: SaHashSet::from_iter([header]),
                        });

                        loops.len() - 1
                    }
                };

                let lp = &mut loops[index];

                if !lp.latches.contains(&latch) {
                    lp.latches.push(latch);
                }

                // walk backwards from the latch until the header is hit
                let mut worklist = vec![latch];

                while let Some(bb) = worklist.pop() {
                    if !lp.blocks.insert(bb) {
                        continue;
                    }

                    worklist.extend(
                        preds
                            .get(&bb)
                            .into_iter()
                            .flatten()
                            .copied()
                            .filter(|&pred| domtree.is_reachable(pred)),
                    );
                }
            }
        }

        Self { loops }
    }

    /// Gets every loop of the function.
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    /// Checks if `bb` is the header of some loop.
    pub fn is_header(&self, bb: Block) -> bool {
        self.loops.iter().any(|l| l.header == bb)
    }

    /// Gets the number of loops that contain `bb`.
    pub fn depth(&self, bb: Block) -> usize {
        self.loops.iter().filter(|l| l.contains(bb)).count()
    }
}

/// Wrapper analysis that computes a [`LoopInfo`] per function, from the
/// cached [`DominatorTree`].
pub struct LoopInfoAnalysis;

impl FunctionAnalysis for LoopInfoAnalysis {
    const KIND: AnalysisKind = AnalysisKind::LoopInfo;
    type Result = LoopInfo;

    fn run(&mut self, module: &Module, func: &Function, am: &AnalysisCache) -> Result<LoopInfo, PassError> {
        let domtree = am.get_for::<DominanceAnalysis>(module, func.func())?;
        let body = func.body().ok_or_else(|| {
            PassError::Construction(format!("function `{}` has no body", func.name()))
        })?;

        Ok(LoopInfo::compute(body, &domtree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PostOrderAnalysis;
    use crate::ir::{FuncAttributes, Linkage};
    use crate::pass::RegisteredAnalysis;

    #[test]
    fn nested_loops() {
        let mut module = Module::new("m");
        let mut b = module.define_function("f", Linkage::Public, FuncAttributes::default());
        let entry = b.create_block("entry");
        let outer = b.create_block("outer");
        let inner = b.create_block("inner");
        let latch = b.create_block("latch");
        let exit = b.create_block("exit");

        b.switch_to(entry);
        b.br(outer);
        b.switch_to(outer);
        b.br(inner);
        b.switch_to(inner);
        b.condbr(inner, latch);
        b.switch_to(latch);
        b.condbr(outer, exit);
        b.switch_to(exit);
        b.ret();

        let f = b.func();
        let mut am = AnalysisCache::new();

        am.register(RegisteredAnalysis::function(PostOrderAnalysis)).unwrap();
        am.register(RegisteredAnalysis::function(DominanceAnalysis)).unwrap();
        am.register(RegisteredAnalysis::function(LoopInfoAnalysis)).unwrap();

        let info = am.get_for::<LoopInfoAnalysis>(&module, f).unwrap();

        assert_eq!(info.loops().len(), 2);
        assert!(info.is_header(outer));
        assert!(info.is_header(inner));
        assert!(!info.is_header(entry));
        assert_eq!(info.depth(inner), 2);
        assert_eq!(info.depth(latch), 1);
        assert_eq!(info.depth(exit), 0);

        let outer_loop = info.loops().iter().find(|l| l.header() == outer).unwrap();

        assert_eq!(outer_loop.latches(), &[latch]);
        assert_eq!(outer_loop.len(), 3);
        assert!(!outer_loop.contains(entry));
    }
}
