//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{PostOrder, PostOrderAnalysis};
use crate::ir::{Block, Body, Function, Module};
use crate::pass::{AnalysisCache, AnalysisKind, FunctionAnalysis, PassError};
use crate::utility::SaHashMap;
use smallvec::SmallVec;

/// Models the dominator tree of a function.
///
/// Only blocks reachable from the entry are part of the tree.
///
/// # Implementation
/// The algorithm used is described in "A Simple, Fast Dominance Algorithm"
/// by Cooper et. al. The tree is stored as a map of `block -> idom(block)`.
#[derive(Debug)]
pub struct DominatorTree {
    idoms: SaHashMap<Block, Block>,
    root: Block,
}

impl DominatorTree {
    /// Computes dominance information from a body and a postorder of it.
    ///
    /// Returns `None` if the body has no blocks.
    pub fn compute(body: &Body, po: &PostOrder) -> Option<Self> {
        let root = po.postorder().last().copied()?;
        let preds = body.predecessors();
        let mut idoms = SaHashMap::default();
        let mut changed = true;

        // for the purposes of the algorithm, the entry node is its own idom
        idoms.insert(root, root);

        while changed {
            changed = false;

            for bb in po.reverse_postorder().skip(1) {
                // every block after the root in reverse postorder has at
                // least one predecessor that was already processed
                let processed: SmallVec<[Block; 8]> = preds
                    .get(&bb)
                    .into_iter()
                    .flatten()
                    .copied()
                    .filter(|pred| idoms.contains_key(pred))
                    .collect();

                let mut iter = processed.into_iter();
                let mut idom = match iter.next() {
                    Some(first) => first,
                    None => continue,
                };

                for pred in iter {
                    idom = intersect(po, &idoms, pred, idom);
                }

                if idoms.insert(bb, idom) != Some(idom) {
                    changed = true;
                }
            }
        }

        idoms.remove(&root);

        Some(Self { idoms, root })
    }

    /// Gets the immediate dominator of `bb`. The entry block and any
    /// unreachable blocks have none.
    pub fn idom(&self, bb: Block) -> Option<Block> {
        self.idoms.get(&bb).copied()
    }

    /// Checks if `possible_dominator` dominates `bb`. A block dominates itself.
    pub fn dominates(&self, bb: Block, possible_dominator: Block) -> bool {
        (bb == possible_dominator && self.is_reachable(bb))
            || self.strictly_dominates(bb, possible_dominator)
    }

    /// Checks if `possible_dominator` strictly dominates `bb`.
    pub fn strictly_dominates(&self, bb: Block, possible_dominator: Block) -> bool {
        let mut curr = bb;

        while let Some(idom) = self.idom(curr) {
            if idom == possible_dominator {
                return true;
            }

            curr = idom;
        }

        false
    }

    /// Gets the entry block of the function.
    pub fn root(&self) -> Block {
        self.root
    }

    /// Checks if `bb` is reachable from the entry block.
    pub fn is_reachable(&self, bb: Block) -> bool {
        bb == self.root || self.idoms.contains_key(&bb)
    }
}

fn intersect(po: &PostOrder, idoms: &SaHashMap<Block, Block>, bb1: Block, bb2: Block) -> Block {
    let number = |bb: Block| po.number(bb).unwrap_or(usize::MAX);
    let mut f1 = bb1;
    let mut f2 = bb2;

    while f1 != f2 {
        while number(f1) < number(f2) {
            f1 = idoms[&f1];
        }

        while number(f2) < number(f1) {
            f2 = idoms[&f2];
        }
    }

    f1
}

/// Wrapper analysis that computes a [`DominatorTree`] per function, from
/// the cached [`PostOrder`].
pub struct DominanceAnalysis;

impl FunctionAnalysis for DominanceAnalysis {
    const KIND: AnalysisKind = AnalysisKind::Dominance;
    type Result = DominatorTree;

    fn run(&mut self, module: &Module, func: &Function, am: &AnalysisCache) -> Result<DominatorTree, PassError> {
        let po = am.get_for::<PostOrderAnalysis>(module, func.func())?;
        let body = func.body().ok_or_else(|| {
            PassError::Construction(format!("function `{}` has no body", func.name()))
        })?;

        DominatorTree::compute(body, &po).ok_or_else(|| {
            PassError::Construction(format!("function `{}` has no entry block", func.name()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FuncAttributes, Linkage};
    use crate::pass::RegisteredAnalysis;

    #[test]
    fn diamond_with_loop() {
        let mut module = Module::new("m");
        let mut b = module.define_function("f", Linkage::Public, FuncAttributes::default());
        let entry = b.create_block("entry");
        let left = b.create_block("left");
        let right = b.create_block("right");
        let join = b.create_block("join");
        let exit = b.create_block("exit");
        let dead = b.create_block("dead");

        b.switch_to(entry);
        b.condbr(left, right);
        b.switch_to(left);
        b.br(join);
        b.switch_to(right);
        b.br(join);
        b.switch_to(join);
        b.condbr(left, exit);
        b.switch_to(exit);
        b.ret();
        b.switch_to(dead);
        b.br(exit);

        let f = b.func();
        let mut am = AnalysisCache::new();

        am.register(RegisteredAnalysis::function(PostOrderAnalysis)).unwrap();
        am.register(RegisteredAnalysis::function(DominanceAnalysis)).unwrap();

        let domtree = am.get_for::<DominanceAnalysis>(&module, f).unwrap();

        assert_eq!(domtree.root(), entry);
        assert_eq!(domtree.idom(entry), None);
        assert_eq!(domtree.idom(left), Some(entry));
        assert_eq!(domtree.idom(join), Some(entry));
        assert_eq!(domtree.idom(exit), Some(join));
        assert!(domtree.dominates(exit, entry));
        assert!(domtree.dominates(join, join));
        assert!(!domtree.strictly_dominates(join, join));
        assert!(!domtree.dominates(join, left));
        assert!(!domtree.is_reachable(dead));

        // the postorder was computed on the way
        assert!(am.is_cached(AnalysisKind::PostOrder, &module, Some(f)));
    }
}
