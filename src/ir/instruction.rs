//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::Block;
use smallvec::{smallvec, SmallVec};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The data that makes up a single instruction.
///
/// Non-terminators are either opaque computations (identified only by their
/// opcode) or direct calls to another function of the same module, resolved
/// by name. Terminators model the control flow between blocks.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum InstData {
    /// Some computation the scheduler does not need to understand.
    Compute(String),
    /// A direct call to the function with the given name.
    Call(String),
    /// `br target`
    Br(Block),
    /// `condbr %cond, if_true, if_false`
    CondBr(Block, Block),
    /// A multi-way branch, e.g. a switch over an enum tag.
    Switch(SmallVec<[Block; 4]>),
    /// Returns from the function.
    Ret,
    /// Marks a point that control flow can never reach.
    Unreachable,
}

impl InstData {
    /// Checks whether the instruction ends a basic block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstData::Br(_)
                | InstData::CondBr(_, _)
                | InstData::Switch(_)
                | InstData::Ret
                | InstData::Unreachable
        )
    }

    /// Gets every block that this instruction may transfer control to, in
    /// operand order. Duplicate edges (e.g. `condbr %c, a, a`) are kept.
    pub fn successors(&self) -> SmallVec<[Block; 2]> {
        match self {
            InstData::Br(target) => smallvec![*target],
            InstData::CondBr(t, f) => smallvec![*t, *f],
            InstData::Switch(targets) => targets.iter().copied().collect(),
            _ => SmallVec::new(),
        }
    }

    /// Rewrites every edge to `old` so that it targets `new` instead.
    pub fn replace_target(&mut self, old: Block, new: Block) {
        let rewrite = |bb: &mut Block| {
            if *bb == old {
                *bb = new;
            }
        };

        match self {
            InstData::Br(target) => rewrite(target),
            InstData::CondBr(t, f) => {
                rewrite(t);
                rewrite(f);
            }
            InstData::Switch(targets) => targets.iter_mut().for_each(rewrite),
            _ => {}
        }
    }

    /// If this is a call, gets the name of the callee.
    pub fn callee(&self) -> Option<&str> {
        match self {
            InstData::Call(name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;

    #[test]
    fn successors_keep_duplicate_edges() {
        let a = Block::key_new(0);
        let inst = InstData::CondBr(a, a);

        assert_eq!(inst.successors().as_slice(), &[a, a]);
        assert!(InstData::Ret.successors().is_empty());
    }

    #[test]
    fn replace_target_rewrites_every_edge() {
        let (a, b, c) = (Block::key_new(0), Block::key_new(1), Block::key_new(2));
        let mut inst = InstData::Switch(smallvec![a, b, a]);

        inst.replace_target(a, c);

        assert_eq!(inst, InstData::Switch(smallvec![c, b, c]));
    }

    #[test]
    fn only_control_flow_terminates() {
        assert!(InstData::Unreachable.is_terminator());
        assert!(!InstData::Call("f".into()).is_terminator());
        assert!(!InstData::Compute("add".into()).is_terminator());
    }
}
