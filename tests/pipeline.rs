//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use lapis::ir::*;
use lapis::pass::*;
use lapis::pipeline::*;
use lapis::transforms::{count_instructions, InstCountPass};
use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<PassKind>>>;

struct Recording {
    kind: PassKind,
    log: Log,
}

impl ModuleTransformPass for Recording {
    fn kind(&self) -> PassKind {
        self.kind
    }

    fn run(&mut self, _: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        self.log.borrow_mut().push(self.kind);

        Ok(())
    }
}

fn recording_registry() -> (PassRegistry, Log) {
    let log = Log::default();
    let shared = Rc::clone(&log);
    let mut registry = PassRegistry::with_builtins();

    registry.register_transforms_with(move |kind| {
        Box::new(Recording {
            kind,
            log: Rc::clone(&shared),
        })
    });

    (registry, log)
}

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn leaf(module: &mut Module, name: &str, attributes: FuncAttributes) {
    let mut b = module.define_function(name, Linkage::Private, attributes);
    let entry = b.create_block("entry");

    b.switch_to(entry);
    b.compute(name);
    b.ret();
}

fn module_with_unreachable_block() -> (Module, Func) {
    let mut module = Module::new("unreachable");
    let mut b = module.define_function("main", Linkage::Public, FuncAttributes::default());
    let entry = b.create_block("entry");
    let dead = b.create_block("dead");
    let exit = b.create_block("exit");

    b.switch_to(entry);
    b.br(exit);
    b.switch_to(dead);
    b.compute("add");
    b.br(exit);
    b.switch_to(exit);
    b.ret();

    let main = b.func();

    (module, main)
}

#[test]
fn unreachable_block_end_to_end() {
    let (mut module, main) = module_with_unreachable_block();
    let options = PipelineOptions::default();

    assert_eq!(module.stage(), Stage::Raw);
    assert!(!lapis::run_diagnostics(&mut module, &options).unwrap());
    assert_eq!(module.stage(), Stage::Canonical);
    assert_eq!(module.diagnostics().count(Severity::Warning), 1);
    assert_eq!(module.diagnostics().count(Severity::Error), 0);
    assert_eq!(module.function(main).body().unwrap().len(), 2);

    // a second run does nothing at all
    let (registry, log) = recording_registry();

    assert!(!run_diagnostic_passes(&mut module, &options, &registry).unwrap());
    assert!(log.borrow().is_empty());
    assert_eq!(module.stage(), Stage::Canonical);
    assert_eq!(module.diagnostics().count(Severity::Warning), 1);
}

#[test]
fn full_pipeline_with_builtins() {
    let mut module = Module::new("m");

    leaf(&mut module, "helper", FuncAttributes::default());
    leaf(&mut module, "unused", FuncAttributes::default());

    let mut b = module.define_function("main", Linkage::Public, FuncAttributes::default());
    let entry = b.create_block("entry");
    let next = b.create_block("next");

    b.switch_to(entry);
    b.call("helper");
    b.br(next);
    b.switch_to(next);
    b.ret();

    let main = b.func();
    let mut registry = PassRegistry::with_builtins();

    registry.register_transform(PassKind::InstCount, |_| {
        Box::new(InstCountPass::with_writer(io::sink()))
    });

    let options = PipelineOptions::default();

    assert!(!run_diagnostic_passes(&mut module, &options, &registry).unwrap());
    run_optimization_passes(&mut module, &options, &registry).unwrap();

    let body = module.function(main).body().unwrap();

    assert_eq!(body.len(), 1);
    assert_eq!(
        body.block(body.entry().unwrap()).insts(),
        &[InstData::Compute("helper".into()), InstData::Ret]
    );
    assert!(module.find_function_by_name("unused").is_none());
    assert!(module.find_function_by_name("helper").is_none());
    assert_eq!(module.function_count(), 1);
}

#[test]
fn stage_is_monotonic() {
    let (registry, _) = recording_registry();
    let mut module = Module::new("m");
    let serialization = PipelineOptions::new().with_debug_serialization(true);

    run_diagnostic_passes(&mut module, &serialization, &registry).unwrap();
    assert_eq!(module.stage(), Stage::Raw);

    run_diagnostic_passes(&mut module, &PipelineOptions::default(), &registry).unwrap();
    assert_eq!(module.stage(), Stage::Canonical);

    run_optimization_passes(&mut module, &PipelineOptions::default(), &registry).unwrap();
    run_diagnostic_passes(&mut module, &serialization, &registry).unwrap();
    assert_eq!(module.stage(), Stage::Canonical);
}

#[test]
fn debug_serialization_ignores_other_flags() {
    let options = PipelineOptions {
        debug_serialization: true,
        enable_function_signature_opts: true,
        print_instruction_counts: true,
        enable_cfg_view: true,
    };

    let (registry, log) = recording_registry();
    let mut module = Module::new("m");

    run_diagnostic_passes(&mut module, &options, &registry).unwrap();
    assert_eq!(log.take(), vec![PassKind::MandatoryInlining]);

    run_optimization_passes(&mut module, &options, &registry).unwrap();
    assert_eq!(log.take(), vec![PassKind::Linker]);
}

#[test]
fn inlining_depends_on_tier() {
    let mut module = Module::new("tiers");

    leaf(
        &mut module,
        "array_get",
        FuncAttributes {
            semantics: Some("array.get".into()),
            ..FuncAttributes::default()
        },
    );
    leaf(
        &mut module,
        "init_global",
        FuncAttributes {
            global_init: true,
            ..FuncAttributes::default()
        },
    );

    let mut b = module.define_function("main", Linkage::Public, FuncAttributes::default());
    let entry = b.create_block("entry");

    b.switch_to(entry);
    b.call("array_get");
    b.call("init_global");
    b.ret();

    let main = b.func();
    let registry = PassRegistry::with_builtins();

    let run = |level: OptimizationLevel| {
        let mut module = module.clone();
        let mut pm = PassManager::new();

        register_analysis_passes(&mut pm, &registry).unwrap();
        add_ssa_passes(&mut pm, &registry, level).unwrap();
        pm.run(&mut module).unwrap();

        let body = module.function(main).body().unwrap();
        let insts = body.block(body.entry().unwrap()).insts();

        (
            insts.contains(&InstData::Call("array_get".into())),
            insts.contains(&InstData::Call("init_global".into())),
        )
    };

    // (still calls array_get, still calls init_global)
    assert_eq!(run(OptimizationLevel::HighLevel), (true, true));
    assert_eq!(run(OptimizationLevel::MidLevel), (false, true));
    assert_eq!(run(OptimizationLevel::LowLevel), (false, false));
}

#[test]
fn instruction_counts_do_not_touch_the_module() {
    let (mut registry, log) = recording_registry();
    let report = SharedBuffer::default();
    let writer = report.clone();

    registry.register_transform(PassKind::InstCount, move |_| {
        Box::new(InstCountPass::with_writer(writer.clone()))
    });

    let (mut module, _) = module_with_unreachable_block();
    let options = PipelineOptions::new().with_instruction_counts(true);

    module.mark_canonical();

    let before = format!("{module:?}");
    let counts = count_instructions(&module);

    run_optimization_passes(&mut module, &options, &registry).unwrap();

    assert_eq!(format!("{module:?}"), before);
    assert_eq!(count_instructions(&module), counts);
    assert_eq!(module.function_count(), 1);
    assert!(!report.0.borrow().is_empty());
    assert!(!log.borrow().contains(&PassKind::InstCount));
}

struct CountingCallGraph {
    runs: Rc<Cell<usize>>,
}

impl ModuleAnalysis for CountingCallGraph {
    const KIND: AnalysisKind = AnalysisKind::CallGraph;
    type Result = usize;

    fn run(&mut self, _: &Module, _: &AnalysisCache) -> Result<usize, PassError> {
        self.runs.set(self.runs.get() + 1);

        Ok(self.runs.get())
    }
}

struct Preserving(PassKind, PreservedAnalyses);

impl ModuleTransformPass for Preserving {
    fn kind(&self) -> PassKind {
        self.0
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        self.1.clone()
    }

    fn run(&mut self, _: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        Ok(())
    }
}

#[test]
fn analyses_survive_segments_but_not_invalidation() {
    let runs = Rc::new(Cell::new(0));
    let mut registry = PassRegistry::with_builtins();
    let counter = Rc::clone(&runs);

    registry.register_analysis(AnalysisKind::CallGraph, move || {
        RegisteredAnalysis::module(CountingCallGraph {
            runs: Rc::clone(&counter),
        })
    });
    registry.register_transform(PassKind::Linker, |kind| {
        Box::new(Preserving(kind, PreservedAnalyses::all()))
    });
    registry.register_transform(PassKind::Combine, |kind| {
        Box::new(Preserving(
            kind,
            PreservedAnalyses::only(&[AnalysisKind::ClassHierarchy]),
        ))
    });

    let mut module = Module::new("m");
    let mut pm = PassManager::with_segment("First");

    register_analysis_passes(&mut pm, &registry).unwrap();

    let first = pm.analyses().get::<CountingCallGraph>(&module).unwrap();

    add_passes(&mut pm, &registry, &[PassKind::Linker]).unwrap();
    pm.run(&mut module).unwrap();
    pm.reset_and_remove_transformations("Second");
    pm.run(&mut module).unwrap();

    let second = pm.analyses().get::<CountingCallGraph>(&module).unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(runs.get(), 1);

    add_passes(&mut pm, &registry, &[PassKind::Combine]).unwrap();
    pm.run(&mut module).unwrap();

    let third = pm.analyses().get::<CountingCallGraph>(&module).unwrap();

    assert!(!Rc::ptr_eq(&second, &third));
    assert_eq!(*third, 2);
    assert_eq!(runs.get(), 2);
}
