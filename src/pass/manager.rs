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
use crate::pass::*;

/// Manages running a schedule of passes over a module.
///
/// The schedule is split into *segments*. Passes are appended to the current
/// segment with [`Self::add`], executed in order with [`Self::run`] or
/// [`Self::run_one_iteration`], and then discarded by
/// [`Self::reset_and_remove_transformations`], which also opens the next
/// segment. Analyses registered into the manager's [`AnalysisCache`] live as
/// long as the manager does, and cached results are only ever dropped
/// because a transform did not preserve them.
///
/// Every manager owns its own cache. A second manager over the same module
/// (e.g. for side reporting) cannot disturb the first one's cached results.
pub struct PassManager {
    analyses: AnalysisCache,
    segment: String,
    passes: Vec<ScheduledPass>,
    iteration: usize,
}

impl PassManager {
    /// Creates a new manager with an empty schedule, in the unnamed segment.
    pub fn new() -> Self {
        Self::with_segment("")
    }

    /// Creates a new manager with an empty schedule, in the segment `name`.
    pub fn with_segment(name: &str) -> Self {
        Self {
            analyses: AnalysisCache::new(),
            segment: name.to_owned(),
            passes: Vec::default(),
            iteration: 0,
        }
    }

    /// Registers an analysis into the manager's cache. This should be done
    /// once per kind, before any passes that need it run.
    pub fn register_analysis(&mut self, analysis: RegisteredAnalysis) -> Result<(), PipelineError> {
        self.analyses.register(analysis)
    }

    /// Adds a transformation pass to the end of the current segment.
    pub fn add<T: ModuleTransformPass + 'static>(&mut self, pass: T) {
        self.add_boxed(Box::new(pass))
    }

    /// Adds an already-boxed transformation pass to the end of the current segment.
    pub fn add_boxed(&mut self, pass: Box<dyn ModuleTransformPass>) {
        self.passes.push(ScheduledPass::Transform(pass));
    }

    /// Adds a pass that forces `kind` to be computed at this point in the schedule.
    pub fn add_analysis(&mut self, kind: AnalysisKind) {
        self.passes.push(ScheduledPass::Analysis(kind));
    }

    /// Closes the current segment and throws away its schedule, then opens
    /// a new segment named `segment`.
    ///
    /// Whatever the discarded passes already did to the module stays done.
    /// Registered analyses and their cached results are left untouched.
    pub fn reset_and_remove_transformations(&mut self, segment: &str) {
        log::debug!(
            "closing segment `{}` ({} passes), opening `{segment}`",
            self.segment,
            self.passes.len()
        );

        self.passes.clear();
        self.segment = segment.to_owned();
        self.iteration = 0;
    }

    /// Runs every pass of the current segment, in order, exactly once.
    pub fn run(&mut self, module: &mut Module) -> Result<(), PipelineError> {
        self.run_one_iteration(module)
    }

    /// Runs every pass of the current segment, in order, exactly once.
    ///
    /// This can be called repeatedly to get closer to a fixed point. The
    /// manager does not check whether anything changed, the caller decides
    /// how many iterations to run.
    pub fn run_one_iteration(&mut self, module: &mut Module) -> Result<(), PipelineError> {
        log::debug!(
            "running segment `{}` (iteration {}, {} passes)",
            self.segment,
            self.iteration + 1,
            self.passes.len()
        );

        for pass in self.passes.iter_mut() {
            match pass {
                ScheduledPass::Transform(pass) => {
                    log::trace!("[{}] running `{}`", self.segment, pass.name());

                    pass.run(module, &self.analyses)
                        .map_err(|err| err.in_pass(pass.name()))?;

                    self.analyses.invalidate_except(&pass.preserved_analyses());
                }
                ScheduledPass::Analysis(kind) => {
                    log::trace!("[{}] forcing analysis `{kind}`", self.segment);

                    self.analyses.force(*kind, module)?;
                }
            }
        }

        self.iteration += 1;

        Ok(())
    }

    /// Gets the name of the current segment.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Gets the number of times the current segment has been run.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Gets the number of passes scheduled in the current segment.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Checks if nothing is scheduled in the current segment.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Gets the names of the passes scheduled in the current segment, in order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(ScheduledPass::name).collect()
    }

    /// Gets the manager's analysis cache.
    pub fn analyses(&self) -> &AnalysisCache {
        &self.analyses
    }

    /// Gets the manager's analysis cache mutably, e.g. to invalidate by hand.
    pub fn analyses_mut(&mut self) -> &mut AnalysisCache {
        &mut self.analyses
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FuncAttributes, Linkage};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Counting<const K: u8> {
        runs: Rc<Cell<usize>>,
    }

    impl ModuleAnalysis for Counting<0> {
        const KIND: AnalysisKind = AnalysisKind::CallGraph;
        type Result = usize;

        fn run(&mut self, _: &Module, _: &AnalysisCache) -> Result<usize, PassError> {
            self.runs.set(self.runs.get() + 1);

            Ok(self.runs.get())
        }
    }

    impl ModuleAnalysis for Counting<1> {
        const KIND: AnalysisKind = AnalysisKind::ClassHierarchy;
        type Result = usize;

        fn run(&mut self, _: &Module, _: &AnalysisCache) -> Result<usize, PassError> {
            self.runs.set(self.runs.get() + 1);

            Ok(self.runs.get())
        }
    }

    struct Recording {
        kind: PassKind,
        log: Rc<RefCell<Vec<PassKind>>>,
        preserved: PreservedAnalyses,
    }

    impl ModuleTransformPass for Recording {
        fn kind(&self) -> PassKind {
            self.kind
        }

        fn preserved_analyses(&self) -> PreservedAnalyses {
            self.preserved.clone()
        }

        fn run(&mut self, _: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
            self.log.borrow_mut().push(self.kind);

            Ok(())
        }
    }

    struct Broken;

    impl ModuleTransformPass for Broken {
        fn kind(&self) -> PassKind {
            PassKind::Sroa
        }

        fn run(&mut self, _: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
            Err(PassError::Internal("aggregate has no fields".into()))
        }
    }

    struct Fixture {
        pm: PassManager,
        log: Rc<RefCell<Vec<PassKind>>>,
        call_graph_runs: Rc<Cell<usize>>,
        hierarchy_runs: Rc<Cell<usize>>,
    }

    impl Fixture {
        fn new() -> Self {
            let call_graph_runs = Rc::new(Cell::new(0));
            let hierarchy_runs = Rc::new(Cell::new(0));
            let mut pm = PassManager::with_segment("First");

            pm.register_analysis(RegisteredAnalysis::module(Counting::<0> {
                runs: Rc::clone(&call_graph_runs),
            }))
            .unwrap();
            pm.register_analysis(RegisteredAnalysis::module(Counting::<1> {
                runs: Rc::clone(&hierarchy_runs),
            }))
            .unwrap();

            Self {
                pm,
                log: Rc::default(),
                call_graph_runs,
                hierarchy_runs,
            }
        }

        fn add(&mut self, kind: PassKind, preserved: PreservedAnalyses) {
            self.pm.add(Recording {
                kind,
                log: Rc::clone(&self.log),
                preserved,
            });
        }
    }

    #[test]
    fn passes_run_in_order() {
        let mut module = Module::new("m");
        let mut fx = Fixture::new();

        fx.add(PassKind::SimplifyCfg, PreservedAnalyses::none());
        fx.add(PassKind::Combine, PreservedAnalyses::none());
        fx.add(PassKind::SimplifyCfg, PreservedAnalyses::none());

        assert_eq!(fx.pm.pass_names(), vec!["simplify-cfg", "combine", "simplify-cfg"]);

        fx.pm.run(&mut module).unwrap();

        assert_eq!(
            *fx.log.borrow(),
            vec![PassKind::SimplifyCfg, PassKind::Combine, PassKind::SimplifyCfg]
        );
        assert_eq!(fx.pm.iteration(), 1);
    }

    #[test]
    fn only_invalidated_analyses_are_recomputed() {
        let mut module = Module::new("m");
        let mut fx = Fixture::new();

        let call_graph = fx.pm.analyses().get::<Counting<0>>(&module).unwrap();
        let hierarchy = fx.pm.analyses().get::<Counting<1>>(&module).unwrap();

        // invalidates the call graph, preserves the class hierarchy
        fx.add(
            PassKind::Devirtualization,
            PreservedAnalyses::only(&[AnalysisKind::ClassHierarchy]),
        );
        fx.pm.run(&mut module).unwrap();

        let hierarchy_after = fx.pm.analyses().get::<Counting<1>>(&module).unwrap();
        let call_graph_after = fx.pm.analyses().get::<Counting<0>>(&module).unwrap();

        assert!(Rc::ptr_eq(&hierarchy, &hierarchy_after));
        assert_eq!(fx.hierarchy_runs.get(), 1);
        assert!(!Rc::ptr_eq(&call_graph, &call_graph_after));
        assert_eq!(fx.call_graph_runs.get(), 2);
    }

    #[test]
    fn reset_clears_schedule_but_not_cache() {
        let mut module = Module::new("m");
        let mut fx = Fixture::new();

        fx.add(PassKind::Linker, PreservedAnalyses::all());
        fx.pm.run(&mut module).unwrap();

        let before = fx.pm.analyses().get::<Counting<0>>(&module).unwrap();

        fx.pm.reset_and_remove_transformations("Second");

        assert_eq!(fx.pm.segment(), "Second");
        assert!(fx.pm.is_empty());
        assert_eq!(fx.pm.iteration(), 0);

        fx.pm.run(&mut module).unwrap();

        let after = fx.pm.analyses().get::<Counting<0>>(&module).unwrap();

        assert_eq!(*fx.log.borrow(), vec![PassKind::Linker]);
        assert!(Rc::ptr_eq(&before, &after));
        assert_eq!(fx.call_graph_runs.get(), 1);
    }

    #[test]
    fn iterations_rerun_the_whole_segment() {
        let mut module = Module::new("m");
        let mut fx = Fixture::new();

        fx.add(PassKind::Dce, PreservedAnalyses::none());
        fx.pm.run_one_iteration(&mut module).unwrap();
        fx.pm.run_one_iteration(&mut module).unwrap();

        assert_eq!(*fx.log.borrow(), vec![PassKind::Dce, PassKind::Dce]);
        assert_eq!(fx.pm.iteration(), 2);
    }

    #[test]
    fn internal_errors_abort_the_segment() {
        let mut module = Module::new("m");
        let mut fx = Fixture::new();

        fx.add(PassKind::LowerAggregate, PreservedAnalyses::none());
        fx.pm.add(Broken);
        fx.add(PassKind::Mem2Reg, PreservedAnalyses::none());

        let err = fx.pm.run(&mut module).unwrap_err();

        assert!(matches!(err, PipelineError::PassInternal { ref pass, .. } if pass == "sroa"));
        assert_eq!(*fx.log.borrow(), vec![PassKind::LowerAggregate]);
        assert_eq!(fx.pm.iteration(), 0);
    }

    #[test]
    fn analysis_passes_populate_the_cache() {
        let mut module = Module::new("m");
        let mut fx = Fixture::new();

        fx.pm.add_analysis(AnalysisKind::CallGraph);
        fx.pm.run(&mut module).unwrap();

        assert!(fx
            .pm
            .analyses()
            .is_cached(AnalysisKind::CallGraph, &module, None));
        assert_eq!(fx.call_graph_runs.get(), 1);

        fx.pm.reset_and_remove_transformations("Unregistered");
        fx.pm.add_analysis(AnalysisKind::Dominance);

        assert!(matches!(
            fx.pm.run(&mut module),
            Err(PipelineError::UnregisteredAnalysis(AnalysisKind::Dominance))
        ));
    }

    #[test]
    fn managers_do_not_share_caches() {
        let mut module = Module::new("m");
        module.declare_function("f", Linkage::Public, FuncAttributes::default());

        let fx = Fixture::new();
        let before = fx.pm.analyses().get::<Counting<0>>(&module).unwrap();

        let mut shadow = PassManager::new();
        shadow.add(Recording {
            kind: PassKind::InstCount,
            log: Rc::default(),
            preserved: PreservedAnalyses::none(),
        });
        shadow.run(&mut module).unwrap();

        let after = fx.pm.analyses().get::<Counting<0>>(&module).unwrap();

        assert!(Rc::ptr_eq(&before, &after));
        assert_eq!(shadow.analyses().cached_count(), 0);
    }
}
