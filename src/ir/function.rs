//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::ArenaMap;
use crate::ir::{Block, Func, InstData};
use crate::utility::SaHashMap;
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Whether a function is visible outside of its module.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Linkage {
    /// Visible to other modules, can never be removed as dead.
    Public,
    /// Only visible inside of the module.
    Private,
}

/// Attributes that the inliners and other optimizations base decisions on.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct FuncAttributes {
    /// The function has externally-defined semantics (e.g. `array.get`)
    /// that high-level optimizations recognize by name, so it should stay
    /// a call until those optimizations are done.
    pub semantics: Option<String>,
    /// The function lazily initializes a global.
    pub global_init: bool,
    /// The function must be inlined into every caller for correctness.
    pub transparent: bool,
}

impl FuncAttributes {
    /// Checks if the function has externally-defined semantics.
    pub fn has_semantics(&self) -> bool {
        self.semantics.is_some()
    }
}

/// A single basic block: a name and a list of instructions, the last of
/// which is expected to be a terminator.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct BlockData {
    name: String,
    insts: Vec<InstData>,
}

impl BlockData {
    /// Gets the name of the block.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the instructions of the block, in order.
    pub fn insts(&self) -> &[InstData] {
        &self.insts
    }

    /// Gets mutable access to the instructions of the block.
    pub fn insts_mut(&mut self) -> &mut Vec<InstData> {
        &mut self.insts
    }

    /// Gets the terminator of the block, if the last instruction is one.
    pub fn terminator(&self) -> Option<&InstData> {
        self.insts.last().filter(|inst| inst.is_terminator())
    }
}

/// The definition of a function: its blocks and the order they are laid out in.
///
/// The first block in the layout is the entry block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Body {
    blocks: ArenaMap<Block, BlockData>,
    layout: Vec<Block>,
}

impl Body {
    /// Gets the entry block, if the body has any blocks at all.
    pub fn entry(&self) -> Option<Block> {
        self.layout.first().copied()
    }

    /// Iterates over the blocks in layout order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.layout.iter().copied()
    }

    /// Gets the number of live blocks.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    /// Checks if the body has no blocks.
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Checks whether `bb` refers to a live block of this body.
    pub fn contains(&self, bb: Block) -> bool {
        self.blocks.contains(bb)
    }

    /// Resolves a block reference.
    pub fn block(&self, bb: Block) -> &BlockData {
        &self.blocks[bb]
    }

    /// Resolves a block reference.
    pub fn block_mut(&mut self, bb: Block) -> &mut BlockData {
        &mut self.blocks[bb]
    }

    /// Creates a new empty block at the end of the layout.
    pub fn create_block(&mut self, name: &str) -> Block {
        let bb = self.insert_block_data(name);

        self.layout.push(bb);

        bb
    }

    /// Creates a new empty block placed directly after `after` in the layout.
    pub fn create_block_after(&mut self, name: &str, after: Block) -> Block {
        let bb = self.insert_block_data(name);
        let pos = self
            .layout
            .iter()
            .position(|&b| b == after)
            .map_or(self.layout.len(), |p| p + 1);

        self.layout.insert(pos, bb);

        bb
    }

    /// Removes a block from the body. Edges that still target it are left
    /// dangling, the caller is responsible for rewriting them.
    pub fn remove_block(&mut self, bb: Block) -> Option<BlockData> {
        self.layout.retain(|&b| b != bb);
        self.blocks.remove(bb)
    }

    /// Gets the successors of a block, as determined by its terminator.
    pub fn successors(&self, bb: Block) -> SmallVec<[Block; 2]> {
        self.blocks[bb]
            .terminator()
            .map(InstData::successors)
            .unwrap_or_default()
    }

    /// Computes the predecessor list of every block. Each edge is recorded,
    /// so a block reached twice from the same `condbr` lists it twice.
    pub fn predecessors(&self) -> SaHashMap<Block, SmallVec<[Block; 4]>> {
        let mut preds = SaHashMap::<Block, SmallVec<[Block; 4]>>::default();

        for bb in self.blocks() {
            preds.entry(bb).or_default();

            for succ in self.successors(bb) {
                preds.entry(succ).or_default().push(bb);
            }
        }

        preds
    }

    /// Counts every instruction in the body.
    pub fn inst_count(&self) -> usize {
        self.blocks.values().map(|data| data.insts.len()).sum()
    }

    fn insert_block_data(&mut self, name: &str) -> Block {
        self.blocks.insert(BlockData {
            name: name.to_owned(),
            insts: Vec::default(),
        })
    }
}

/// A single function of a module, either only declared or also defined.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Function {
    name: String,
    func: Func,
    linkage: Linkage,
    attributes: FuncAttributes,
    body: Option<Body>,
}

impl Function {
    pub(in crate::ir) fn new(
        name: String,
        func: Func,
        linkage: Linkage,
        attributes: FuncAttributes,
    ) -> Self {
        Self {
            name,
            func,
            linkage,
            attributes,
            body: None,
        }
    }

    /// Gets the name of the function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the [`Func`] that refers to this function in its module.
    pub fn func(&self) -> Func {
        self.func
    }

    /// Gets the linkage of the function.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Gets the attributes of the function.
    pub fn attributes(&self) -> &FuncAttributes {
        &self.attributes
    }

    /// Checks whether the function has a body.
    pub fn is_defined(&self) -> bool {
        self.body.is_some()
    }

    /// Gets the body of the function, if it has one.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Gets the body of the function, if it has one.
    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }

    /// Gets the body of the function, creating an empty one if the
    /// function was only declared.
    pub fn define(&mut self) -> &mut Body {
        self.body.get_or_insert_with(Body::default)
    }

    /// Counts the instructions in the function, zero for declarations.
    pub fn inst_count(&self) -> usize {
        self.body.as_ref().map_or(0, Body::inst_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;

    fn diamond() -> (Body, [Block; 4]) {
        let mut body = Body::default();
        let entry = body.create_block("entry");
        let left = body.create_block("left");
        let right = body.create_block("right");
        let exit = body.create_block("exit");

        body.block_mut(entry)
            .insts_mut()
            .push(InstData::CondBr(left, right));
        body.block_mut(left).insts_mut().push(InstData::Br(exit));
        body.block_mut(right).insts_mut().push(InstData::Br(exit));
        body.block_mut(exit).insts_mut().push(InstData::Ret);

        (body, [entry, left, right, exit])
    }

    #[test]
    fn predecessors_of_diamond() {
        let (body, [entry, left, right, exit]) = diamond();
        let preds = body.predecessors();

        assert!(preds[&entry].is_empty());
        assert_eq!(preds[&left].as_slice(), &[entry]);
        assert_eq!(preds[&exit].as_slice(), &[left, right]);
    }

    #[test]
    fn create_block_after_places_in_layout() {
        let (mut body, [entry, left, right, exit]) = diamond();
        let split = body.create_block_after("split", entry);

        assert_eq!(
            body.blocks().collect::<Vec<_>>(),
            vec![entry, split, left, right, exit]
        );
        assert_eq!(body.entry(), Some(entry));
    }

    #[test]
    fn remove_block_updates_layout() {
        let (mut body, [entry, left, right, exit]) = diamond();

        assert!(body.remove_block(left).is_some());
        assert!(!body.contains(left));
        assert_eq!(body.blocks().collect::<Vec<_>>(), vec![entry, right, exit]);
        assert_eq!(body.inst_count(), 3);
    }

    #[test]
    fn declarations_have_no_instructions() {
        let f = Function::new(
            "f".into(),
            Func::key_new(0),
            Linkage::Private,
            FuncAttributes::default(),
        );

        assert!(!f.is_defined());
        assert_eq!(f.inst_count(), 0);
    }
}
