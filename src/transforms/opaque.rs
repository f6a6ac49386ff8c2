//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::Module;
use crate::pass::{AnalysisCache, ModuleTransformPass, PassError, PassKind};

/// Stands in for a transform of the catalogue that has no built-in
/// implementation over this IR.
///
/// It does nothing to the module, but it keeps its place in the schedule
/// and it invalidates every analysis, just like the real pass would be
/// allowed to. Embedders replace it through the
/// [`PassRegistry`](crate::pipeline::PassRegistry).
pub struct OpaquePass {
    kind: PassKind,
}

impl OpaquePass {
    /// Creates a placeholder for `kind`.
    pub fn new(kind: PassKind) -> Self {
        Self { kind }
    }
}

impl ModuleTransformPass for OpaquePass {
    fn kind(&self) -> PassKind {
        self.kind
    }

    fn run(&mut self, module: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        log::trace!("`{}` has no implementation, skipping `{}`", self.kind, module.name());

        Ok(())
    }
}
