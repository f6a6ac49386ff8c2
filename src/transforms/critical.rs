//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, Body, InstData, Module};
use crate::pass::{AnalysisCache, AnalysisKind, ModuleTransformPass, PassError, PassKind, PreservedAnalyses};

/// Performs critical-edge splitting for every edge that does not come
/// from a `condbr`.
///
/// Each edge that is split has a dummy node inserted that contains only an
/// unconditional branch to the block that was originally being targeted.
#[derive(Default)]
pub struct SplitCriticalEdgesPass {
    changed: bool,
}

impl ModuleTransformPass for SplitCriticalEdgesPass {
    fn kind(&self) -> PassKind {
        PassKind::SplitNonCondBrCriticalEdges
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        if self.changed {
            // no calls are added or removed
            PreservedAnalyses::only(&[AnalysisKind::CallGraph])
        } else {
            PreservedAnalyses::all()
        }
    }

    fn run(&mut self, module: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        let funcs: Vec<_> = module.functions().collect();
        let mut split = 0;

        for func in funcs {
            if let Some(body) = module.function_mut(func).body_mut() {
                split += split_non_condbr_crit_edges(body);
            }
        }

        if split != 0 {
            log::debug!("split {split} critical edges in `{}`", module.name());
        }

        self.changed = split != 0;

        Ok(())
    }
}

/// Splits every critical edge of a body whose source terminator is not a
/// `condbr`, and returns how many were split.
///
/// Each pair of `(pred, succ)` is only split once, even if `pred` has several
/// edges to `succ`. All of those edges are routed through the same split block.
pub fn split_non_condbr_crit_edges(body: &mut Body) -> usize {
    let preds = body.predecessors();
    let mut critical_edges = Vec::default();

    for bb in body.blocks() {
        let terminator = match body.block(bb).terminator() {
            Some(term) if !matches!(term, InstData::CondBr(..)) => term,
            _ => continue,
        };

        let successors = terminator.successors();

        // critical edge: any edge between a block with multiple successors
        // to a block with multiple predecessors
        if successors.len() <= 1 {
            continue;
        }

        for succ in successors {
            let is_critical = preds.get(&succ).map_or(0, |p| p.len()) > 1;

            if is_critical && !critical_edges.contains(&(bb, succ)) {
                critical_edges.push((bb, succ));
            }
        }
    }

    // holds the previous pred and the split associated with it, so that if
    // one block needs multiple splits they end up in the order they were processed in.
    let mut previous: Option<(Block, Block)> = None;

    for &(pred, succ) in critical_edges.iter() {
        let name = format!(
            "{}.{}.split_crit_edge",
            body.block(pred).name(),
            body.block(succ).name()
        );

        let insert_after = match previous {
            Some((prev_pred, prev_split)) if prev_pred == pred => prev_split,
            _ => pred,
        };

        let split = body.create_block_after(&name, insert_after);

        previous = Some((pred, split));

        if let Some(term) = body.block_mut(pred).insts_mut().last_mut() {
            term.replace_target(succ, split);
        }

        body.block_mut(split).insts_mut().push(InstData::Br(succ));
    }

    critical_edges.len()
}
