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
use crate::ir::{DiagnosticContext, Func, FuncAttributes, FuncBuilder, Function, Linkage};
use crate::utility::SaHashMap;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Used to identify different [`Module`] instances efficiently.
///
/// Every [`Module`] has some data allocated on the heap that is guaranteed
/// to not move around, the address of this data can be used to distinguish
/// between modules.
///
/// Note that this is not a way of telling if modules are *equivalent*,
/// this is a way of identifying the *same module*.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ModuleIdentity(usize);

/// How far along the pipeline a module is.
///
/// The only transition is `Raw -> Canonical`, made once by the diagnostic
/// pipeline. Canonical is terminal.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Stage {
    /// Freshly generated IR, the mandatory diagnostic passes have not run.
    Raw,
    /// The diagnostic passes have run, the IR may be optimized.
    Canonical,
}

/// Contains all the data for a single unit of compilation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Module {
    identity: Box<u8>,
    name: String,
    stage: Stage,
    functions: ArenaMap<Func, Function>,
    names: SaHashMap<String, Func>,
    diagnostics: DiagnosticContext,
}

impl Module {
    /// Creates a new, empty module in the [`Stage::Raw`] stage.
    pub fn new(name: &str) -> Self {
        Self {
            identity: Box::new(0),
            name: name.to_owned(),
            stage: Stage::Raw,
            functions: ArenaMap::default(),
            names: SaHashMap::default(),
            diagnostics: DiagnosticContext::default(),
        }
    }

    /// Gets the name of the module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a [`ModuleIdentity`] that refers to the object.
    pub fn identity(&self) -> ModuleIdentity {
        ModuleIdentity(self.identity.as_ref() as *const _ as usize)
    }

    /// Gets the current stage of the module.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves the module into [`Stage::Canonical`]. Calling this on a module
    /// that is already canonical does nothing, there is no way back to raw.
    pub fn mark_canonical(&mut self) {
        if self.stage == Stage::Raw {
            log::debug!("module `{}` is now canonical", self.name);
        }

        self.stage = Stage::Canonical;
    }

    /// Gets the diagnostics recorded for this module.
    pub fn diagnostics(&self) -> &DiagnosticContext {
        &self.diagnostics
    }

    /// Gets the diagnostic context so that a pass can record into it.
    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticContext {
        &mut self.diagnostics
    }

    /// Resolves a [`Func`] into a real function object.
    pub fn function(&self, func: Func) -> &Function {
        &self.functions[func]
    }

    /// Resolves a [`Func`] into a real function object.
    pub fn function_mut(&mut self, func: Func) -> &mut Function {
        &mut self.functions[func]
    }

    /// Checks if `func` still refers to a function of the module.
    pub fn contains_function(&self, func: Func) -> bool {
        self.functions.contains(func)
    }

    /// Finds a [`Func`] with a given name. If no function with that name
    /// exists in the module, `None` is returned.
    pub fn find_function_by_name(&self, name: &str) -> Option<Func> {
        self.names.get(name).copied()
    }

    /// Iterates over all of the functions in the module, in creation order.
    ///
    /// Collect this first if functions need to be mutated while iterating.
    pub fn functions(&self) -> impl Iterator<Item = Func> + '_ {
        self.functions.keys()
    }

    /// Gets the number of functions in the module.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Declares a function without providing it a definition.
    pub fn declare_function(
        &mut self,
        name: &str,
        linkage: Linkage,
        attributes: FuncAttributes,
    ) -> Func {
        debug_assert!(self.find_function_by_name(name).is_none());

        let func = self.functions.next_key();
        let new = Function::new(name.to_owned(), func, linkage, attributes);

        self.functions.insert(new);
        self.names.insert(name.to_owned(), func);

        func
    }

    /// Declares and then defines a new function.
    pub fn define_function(
        &mut self,
        name: &str,
        linkage: Linkage,
        attributes: FuncAttributes,
    ) -> FuncBuilder<'_> {
        let func = self.declare_function(name, linkage, attributes);

        FuncBuilder::new(self, func)
    }

    /// Returns a [`FuncBuilder`] that appends to a previously-declared function.
    pub fn define_existing_function(&mut self, func: Func) -> FuncBuilder<'_> {
        FuncBuilder::new(self, func)
    }

    /// Removes a function from the module. Any calls that still name it
    /// will fail verification.
    pub fn remove_function(&mut self, func: Func) -> Option<Function> {
        let removed = self.functions.remove(func)?;

        self.names.remove(removed.name());

        Some(removed)
    }
}
