//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Func, Function, Module, ModuleIdentity};
use crate::pass::{PassError, PipelineError};
use crate::utility::SaHashMap;
use smallvec::SmallVec;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

/// Every kind of analysis that the pipeline knows how to cache.
///
/// A cache holds at most one registered analysis per kind, and at most one
/// live result per kind (per function, for function-scoped kinds).
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum AnalysisKind {
    /// Which functions call which.
    CallGraph,
    /// May-alias information for memory operations.
    Alias,
    /// Dominator trees of each function.
    Dominance,
    /// The natural loops of each function.
    LoopInfo,
    /// Induction variables of loops.
    InductionVariable,
    /// Post-order block traversals of each function.
    PostOrder,
    /// The class hierarchy visible in the module.
    ClassHierarchy,
    /// Reference-count identity roots of values.
    RcIdentity,
    /// Which destructors are known to have no side effects.
    Destructor,
}

impl AnalysisKind {
    /// Every analysis kind, in the order the pipelines register them.
    pub const ALL: [AnalysisKind; 9] = [
        AnalysisKind::CallGraph,
        AnalysisKind::Alias,
        AnalysisKind::Dominance,
        AnalysisKind::LoopInfo,
        AnalysisKind::InductionVariable,
        AnalysisKind::PostOrder,
        AnalysisKind::ClassHierarchy,
        AnalysisKind::RcIdentity,
        AnalysisKind::Destructor,
    ];

    /// Gets the stable, human-readable name of the analysis.
    pub fn name(self) -> &'static str {
        match self {
            AnalysisKind::CallGraph => "call-graph",
            AnalysisKind::Alias => "alias",
            AnalysisKind::Dominance => "dominance",
            AnalysisKind::LoopInfo => "loop-info",
            AnalysisKind::InductionVariable => "induction-variable",
            AnalysisKind::PostOrder => "post-order",
            AnalysisKind::ClassHierarchy => "class-hierarchy",
            AnalysisKind::RcIdentity => "rc-identity",
            AnalysisKind::Destructor => "destructor",
        }
    }
}

impl Display for AnalysisKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Models the set of analyses that a given transformation pass
/// preserves. Everything not in the set is invalidated.
///
/// This is not a contract that is checked, it is expected the the transform
/// knows what analyses it can preserve. If it reports incorrectly, later
/// passes will be handed stale analyses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreservedAnalyses {
    all: bool,
    // sorted so we can binary_search for `contains`
    preserved: SmallVec<[AnalysisKind; 4]>,
}

impl PreservedAnalyses {
    /// Returns a [`PreservedAnalyses`] that marks every analysis as preserved.
    pub fn all() -> Self {
        Self {
            all: true,
            preserved: SmallVec::new(),
        }
    }

    /// Returns a [`PreservedAnalyses`] that marks every analysis as invalidated.
    pub fn none() -> Self {
        Self {
            all: false,
            preserved: SmallVec::new(),
        }
    }

    /// Returns a set that preserves exactly the analyses in `kinds`.
    pub fn only(kinds: &[AnalysisKind]) -> Self {
        let mut new = Self::none();

        for &kind in kinds {
            new.preserve(kind);
        }

        new
    }

    /// Checks if *all* analyses are preserved. If this is true, the
    /// transformation effectively reports to have not changed *anything*.
    pub fn preserves_all(&self) -> bool {
        self.all
    }

    /// Reports that an analysis is preserved by the current transformation.
    pub fn preserve(&mut self, kind: AnalysisKind) {
        if let Err(pos) = self.preserved.binary_search(&kind) {
            self.preserved.insert(pos, kind);
        }
    }

    /// Gets the intersection of two sets of preserved analyses, returning
    /// the analyses that are preserved both by `self` and by `other`.
    pub fn intersect(self, other: PreservedAnalyses) -> PreservedAnalyses {
        if self.preserves_all() {
            return other;
        }

        if other.preserves_all() {
            return self;
        }

        let mut new = PreservedAnalyses::none();

        for kind in self.preserved.into_iter().filter(|k| other.contains(*k)) {
            new.preserve(kind);
        }

        new
    }

    /// Checks if an analysis is preserved.
    pub fn is_preserved(&self, kind: AnalysisKind) -> bool {
        self.all || self.contains(kind)
    }

    /// Checks if an analysis is invalidated, the inverse of [`Self::is_preserved`].
    pub fn invalidates(&self, kind: AnalysisKind) -> bool {
        !self.is_preserved(kind)
    }

    fn contains(&self, kind: AnalysisKind) -> bool {
        self.preserved.binary_search(&kind).is_ok()
    }
}

/// An analysis that is computed over an entire module.
pub trait ModuleAnalysis: Any {
    /// The kind that this analysis is cached under.
    const KIND: AnalysisKind;

    /// The result type of the analysis.
    type Result: Any;

    /// Performs the analysis and returns a computed result.
    ///
    /// This should act as-if it was pure: running the analysis twice on the
    /// same input should produce the same result. Other analyses can be
    /// requested through `am`.
    fn run(&mut self, module: &Module, am: &AnalysisCache) -> Result<Self::Result, PassError>;
}

/// An analysis that is computed for a single function at a time.
pub trait FunctionAnalysis: Any {
    /// The kind that this analysis is cached under.
    const KIND: AnalysisKind;

    /// The result type of the analysis.
    type Result: Any;

    /// Performs the analysis over `func` and returns a computed result.
    ///
    /// The same purity requirement as [`ModuleAnalysis::run`] applies.
    fn run(
        &mut self,
        module: &Module,
        func: &Function,
        am: &AnalysisCache,
    ) -> Result<Self::Result, PassError>;
}

/// Whether an analysis result describes a whole module or a single function.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum AnalysisScope {
    /// One result per module.
    Module,
    /// One result per function.
    Function,
}

trait ErasedAnalysis {
    fn run(
        &mut self,
        module: &Module,
        func: Option<Func>,
        am: &AnalysisCache,
    ) -> Result<Rc<dyn Any>, PassError>;
}

struct ModuleWrapper<T>(T);

impl<T: ModuleAnalysis> ErasedAnalysis for ModuleWrapper<T> {
    fn run(
        &mut self,
        module: &Module,
        _: Option<Func>,
        am: &AnalysisCache,
    ) -> Result<Rc<dyn Any>, PassError> {
        Ok(Rc::new(self.0.run(module, am)?))
    }
}

struct FunctionWrapper<T>(T);

impl<T: FunctionAnalysis> ErasedAnalysis for FunctionWrapper<T> {
    fn run(
        &mut self,
        module: &Module,
        func: Option<Func>,
        am: &AnalysisCache,
    ) -> Result<Rc<dyn Any>, PassError> {
        let func = func
            .filter(|&f| module.contains_function(f))
            .ok_or_else(|| PassError::Construction("function is not part of the module".into()))?;

        Ok(Rc::new(self.0.run(module, module.function(func), am)?))
    }
}

/// An analysis, type-erased and ready to be installed into an [`AnalysisCache`].
///
/// This is the "factory" that the cache invokes lazily whenever the result
/// for its kind is requested and not currently cached.
pub struct RegisteredAnalysis {
    kind: AnalysisKind,
    scope: AnalysisScope,
    inner: Box<dyn ErasedAnalysis>,
}

impl RegisteredAnalysis {
    /// Wraps a module-scoped analysis.
    pub fn module<T: ModuleAnalysis>(analysis: T) -> Self {
        Self {
            kind: T::KIND,
            scope: AnalysisScope::Module,
            inner: Box::new(ModuleWrapper(analysis)),
        }
    }

    /// Wraps a function-scoped analysis.
    pub fn function<T: FunctionAnalysis>(analysis: T) -> Self {
        Self {
            kind: T::KIND,
            scope: AnalysisScope::Function,
            inner: Box::new(FunctionWrapper(analysis)),
        }
    }

    /// Gets the kind the analysis will be cached under.
    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    /// Gets the scope of the analysis.
    pub fn scope(&self) -> AnalysisScope {
        self.scope
    }
}

impl Debug for RegisteredAnalysis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredAnalysis")
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .finish()
    }
}

struct Entry {
    scope: AnalysisScope,
    analysis: RefCell<Box<dyn ErasedAnalysis>>,
}

type CacheKey = (AnalysisKind, ModuleIdentity, Option<Func>);

/// A lazy cache of analysis results.
///
/// Analyses are registered once per kind through [`Self::register`], and can
/// then be requested through [`Self::get`] (module-scoped) or
/// [`Self::get_for`] (function-scoped). A request either returns the cached
/// result, or computes the result, caches it, and then returns it.
///
/// Results are handed out as [`Rc`]s. A result stays cached (and requests
/// keep returning the *same* `Rc`) until it is invalidated, at which point the
/// cache forgets it and the next request recomputes it. Passes must not hold
/// onto a result past the end of their run.
#[derive(Default)]
pub struct AnalysisCache {
    entries: SaHashMap<AnalysisKind, Entry>,
    results: RefCell<SaHashMap<CacheKey, Rc<dyn Any>>>,
}

impl AnalysisCache {
    /// Creates an empty cache with no analyses registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs an analysis. It is not run until it is requested.
    ///
    /// Fails if an analysis of the same kind is already registered.
    pub fn register(&mut self, analysis: RegisteredAnalysis) -> Result<(), PipelineError> {
        if self.entries.contains_key(&analysis.kind) {
            return Err(PipelineError::DuplicateAnalysis(analysis.kind));
        }

        self.entries.insert(
            analysis.kind,
            Entry {
                scope: analysis.scope,
                analysis: RefCell::new(analysis.inner),
            },
        );

        Ok(())
    }

    /// Checks whether an analysis of a given kind is registered.
    pub fn is_registered(&self, kind: AnalysisKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Gets the scope of a registered analysis.
    pub fn scope_of(&self, kind: AnalysisKind) -> Option<AnalysisScope> {
        self.entries.get(&kind).map(|entry| entry.scope)
    }

    /// Lazily gets the result of a module analysis. If the analysis has been
    /// invalidated (or never computed), the result is computed and cached first.
    pub fn get<T: ModuleAnalysis>(&self, module: &Module) -> Result<Rc<T::Result>, PipelineError> {
        let result = self.compute(T::KIND, AnalysisScope::Module, module, None)?;

        Rc::downcast::<T::Result>(result)
            .map_err(|_| PipelineError::AnalysisTypeMismatch { kind: T::KIND })
    }

    /// Lazily gets the result of a function analysis for `func`.
    pub fn get_for<T: FunctionAnalysis>(
        &self,
        module: &Module,
        func: Func,
    ) -> Result<Rc<T::Result>, PipelineError> {
        let result = self.compute(T::KIND, AnalysisScope::Function, module, Some(func))?;

        Rc::downcast::<T::Result>(result)
            .map_err(|_| PipelineError::AnalysisTypeMismatch { kind: T::KIND })
    }

    /// Computes (if necessary) and caches the result of an analysis without
    /// needing to know its result type. Function-scoped analyses are
    /// computed for every defined function of the module.
    pub fn force(&self, kind: AnalysisKind, module: &Module) -> Result<(), PipelineError> {
        let scope = self
            .scope_of(kind)
            .ok_or(PipelineError::UnregisteredAnalysis(kind))?;

        match scope {
            AnalysisScope::Module => {
                self.compute(kind, scope, module, None)?;
            }
            AnalysisScope::Function => {
                for func in module.functions() {
                    if module.function(func).is_defined() {
                        self.compute(kind, scope, module, Some(func))?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Checks whether a result is currently cached for `kind`, either for the
    /// whole module (`func == None`) or for a single function.
    pub fn is_cached(&self, kind: AnalysisKind, module: &Module, func: Option<Func>) -> bool {
        self.results
            .borrow()
            .contains_key(&(kind, module.identity(), func))
    }

    /// Gets the number of results currently cached.
    pub fn cached_count(&self) -> usize {
        self.results.borrow().len()
    }

    /// Drops every cached result of a given kind. The next request recomputes it.
    pub fn invalidate(&mut self, kind: AnalysisKind) {
        log::trace!("invalidating analysis `{kind}`");

        self.results.get_mut().retain(|(k, _, _), _| *k != kind);
    }

    /// Drops every cached result.
    pub fn invalidate_all(&mut self) {
        log::trace!("invalidating all cached analyses");

        self.results.get_mut().clear();
    }

    /// Drops the cached result of every analysis that `preserved` does not preserve.
    pub fn invalidate_except(&mut self, preserved: &PreservedAnalyses) {
        if preserved.preserves_all() {
            return;
        }

        self.results.get_mut().retain(|(kind, _, _), _| {
            let keep = preserved.is_preserved(*kind);

            if !keep {
                log::trace!("invalidating analysis `{kind}`");
            }

            keep
        });
    }

    fn compute(
        &self,
        kind: AnalysisKind,
        scope: AnalysisScope,
        module: &Module,
        func: Option<Func>,
    ) -> Result<Rc<dyn Any>, PipelineError> {
        let entry = self
            .entries
            .get(&kind)
            .ok_or(PipelineError::UnregisteredAnalysis(kind))?;

        if entry.scope != scope {
            return Err(PipelineError::AnalysisScopeMismatch { kind });
        }

        let key = (kind, module.identity(), func);

        // the borrow on `results` has to end before running the analysis,
        // since it may request other analyses through `self`
        if let Some(cached) = self.results.borrow().get(&key) {
            return Ok(Rc::clone(cached));
        }

        let result = {
            let mut analysis = entry
                .analysis
                .try_borrow_mut()
                .map_err(|_| PipelineError::CyclicAnalysis(kind))?;

            match func {
                Some(f) if module.contains_function(f) => log::trace!(
                    "computing analysis `{kind}` for `{}`",
                    module.function(f).name()
                ),
                _ => log::trace!("computing analysis `{kind}`"),
            }

            analysis
                .run(module, func, self)
                .map_err(|err| err.in_analysis(kind))?
        };

        self.results.borrow_mut().insert(key, Rc::clone(&result));

        Ok(result)
    }
}

impl Debug for AnalysisCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.entries.keys().collect();

        kinds.sort();

        f.debug_struct("AnalysisCache")
            .field("registered", &kinds)
            .field("cached", &self.cached_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FuncAttributes, Linkage};
    use std::cell::Cell;

    struct Counting {
        runs: Rc<Cell<usize>>,
    }

    impl ModuleAnalysis for Counting {
        const KIND: AnalysisKind = AnalysisKind::CallGraph;
        type Result = usize;

        fn run(&mut self, _: &Module, _: &AnalysisCache) -> Result<usize, PassError> {
            self.runs.set(self.runs.get() + 1);

            Ok(self.runs.get())
        }
    }

    struct PerFunction;

    impl FunctionAnalysis for PerFunction {
        const KIND: AnalysisKind = AnalysisKind::PostOrder;
        type Result = String;

        fn run(&mut self, _: &Module, func: &Function, _: &AnalysisCache) -> Result<String, PassError> {
            Ok(func.name().to_owned())
        }
    }

    struct SelfReferential;

    impl ModuleAnalysis for SelfReferential {
        const KIND: AnalysisKind = AnalysisKind::Alias;
        type Result = ();

        fn run(&mut self, module: &Module, am: &AnalysisCache) -> Result<(), PassError> {
            am.get::<SelfReferential>(module)?;

            Ok(())
        }
    }

    struct Failing;

    impl ModuleAnalysis for Failing {
        const KIND: AnalysisKind = AnalysisKind::Destructor;
        type Result = ();

        fn run(&mut self, _: &Module, _: &AnalysisCache) -> Result<(), PassError> {
            Err(PassError::Construction("cannot see destructors".into()))
        }
    }

    fn counting() -> (RegisteredAnalysis, Rc<Cell<usize>>) {
        let runs = Rc::new(Cell::new(0));
        let analysis = RegisteredAnalysis::module(Counting {
            runs: Rc::clone(&runs),
        });

        (analysis, runs)
    }

    #[test]
    fn results_are_computed_lazily_and_cached() {
        let module = Module::new("m");
        let (analysis, runs) = counting();
        let mut am = AnalysisCache::new();

        am.register(analysis).unwrap();
        assert_eq!(runs.get(), 0);

        let first = am.get::<Counting>(&module).unwrap();
        let second = am.get::<Counting>(&module).unwrap();

        assert_eq!(runs.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut am = AnalysisCache::new();

        am.register(counting().0).unwrap();

        assert!(matches!(
            am.register(counting().0),
            Err(PipelineError::DuplicateAnalysis(AnalysisKind::CallGraph))
        ));
    }

    #[test]
    fn unregistered_request_fails() {
        let module = Module::new("m");
        let am = AnalysisCache::new();

        assert!(matches!(
            am.get::<Counting>(&module),
            Err(PipelineError::UnregisteredAnalysis(AnalysisKind::CallGraph))
        ));
    }

    #[test]
    fn invalidation_forces_recompute() {
        let module = Module::new("m");
        let (analysis, runs) = counting();
        let mut am = AnalysisCache::new();

        am.register(analysis).unwrap();
        am.get::<Counting>(&module).unwrap();

        am.invalidate(AnalysisKind::Alias);
        am.get::<Counting>(&module).unwrap();
        assert_eq!(runs.get(), 1);

        am.invalidate(AnalysisKind::CallGraph);
        assert!(!am.is_cached(AnalysisKind::CallGraph, &module, None));
        assert_eq!(*am.get::<Counting>(&module).unwrap(), 2);

        am.invalidate_all();
        assert_eq!(*am.get::<Counting>(&module).unwrap(), 3);
    }

    #[test]
    fn invalidate_except_keeps_preserved() {
        let module = Module::new("m");
        let (analysis, runs) = counting();
        let mut am = AnalysisCache::new();

        am.register(analysis).unwrap();
        am.get::<Counting>(&module).unwrap();

        am.invalidate_except(&PreservedAnalyses::only(&[AnalysisKind::CallGraph]));
        am.invalidate_except(&PreservedAnalyses::all());
        am.get::<Counting>(&module).unwrap();
        assert_eq!(runs.get(), 1);

        am.invalidate_except(&PreservedAnalyses::none());
        am.get::<Counting>(&module).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn function_results_are_per_function() {
        let mut module = Module::new("m");
        let f = module.declare_function("f", Linkage::Public, FuncAttributes::default());
        let g = module.declare_function("g", Linkage::Public, FuncAttributes::default());
        let mut am = AnalysisCache::new();

        am.register(RegisteredAnalysis::function(PerFunction)).unwrap();

        assert_eq!(*am.get_for::<PerFunction>(&module, f).unwrap(), "f");
        assert_eq!(*am.get_for::<PerFunction>(&module, g).unwrap(), "g");
        assert!(am.is_cached(AnalysisKind::PostOrder, &module, Some(f)));
        assert!(!am.is_cached(AnalysisKind::PostOrder, &module, None));
    }

    #[test]
    fn scope_mismatch_is_reported() {
        let mut module = Module::new("m");
        let f = module.declare_function("f", Linkage::Public, FuncAttributes::default());
        let mut am = AnalysisCache::new();

        am.register(counting().0).unwrap();

        struct WrongScope;

        impl FunctionAnalysis for WrongScope {
            const KIND: AnalysisKind = AnalysisKind::CallGraph;
            type Result = usize;

            fn run(&mut self, _: &Module, _: &Function, _: &AnalysisCache) -> Result<usize, PassError> {
                Ok(0)
            }
        }

        assert!(matches!(
            am.get_for::<WrongScope>(&module, f),
            Err(PipelineError::AnalysisScopeMismatch { .. })
        ));
    }

    #[test]
    fn cycles_are_detected() {
        let module = Module::new("m");
        let mut am = AnalysisCache::new();

        am.register(RegisteredAnalysis::module(SelfReferential)).unwrap();

        assert!(matches!(
            am.get::<SelfReferential>(&module),
            Err(PipelineError::CyclicAnalysis(AnalysisKind::Alias))
        ));
    }

    #[test]
    fn construction_failure_is_not_cached() {
        let module = Module::new("m");
        let mut am = AnalysisCache::new();

        am.register(RegisteredAnalysis::module(Failing)).unwrap();

        assert!(matches!(
            am.get::<Failing>(&module),
            Err(PipelineError::AnalysisConstruction { .. })
        ));
        assert_eq!(am.cached_count(), 0);
    }

    #[test]
    fn preserved_intersection() {
        let a = PreservedAnalyses::only(&[AnalysisKind::Dominance, AnalysisKind::PostOrder]);
        let b = PreservedAnalyses::only(&[AnalysisKind::PostOrder, AnalysisKind::CallGraph]);
        let both = a.clone().intersect(b);

        assert!(both.is_preserved(AnalysisKind::PostOrder));
        assert!(both.invalidates(AnalysisKind::Dominance));
        assert!(both.invalidates(AnalysisKind::CallGraph));
        assert_eq!(PreservedAnalyses::all().intersect(a.clone()), a);
        assert!(PreservedAnalyses::none().invalidates(AnalysisKind::Alias));
    }
}
