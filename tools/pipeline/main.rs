//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use ansi_term::Color::{Blue, Green, Red, White};
use lapis::cli;
use lapis::ir::Module;
use lapis::pass::{AnalysisCache, ModuleTransformPass, PassError, PassKind, PipelineError};
use lapis::pipeline::{self, PassRegistry, PipelineOptions};
use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

type Schedule = Rc<RefCell<Vec<PassKind>>>;

// stands in for every transform, only remembers that it ran
struct RecordingPass {
    kind: PassKind,
    schedule: Schedule,
}

impl ModuleTransformPass for RecordingPass {
    fn kind(&self) -> PassKind {
        self.kind
    }

    fn run(&mut self, _: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        self.schedule.borrow_mut().push(self.kind);

        Ok(())
    }
}

fn main() -> ExitCode {
    #[cfg(windows)]
    ansi_term::enable_ansi_support().expect("unable to enable ANSI");

    let (options, base) = cli::tool_with(
        "prints the pass schedule of the lapis pipelines",
        cli::pipeline_options(),
    )
    .run();

    cli::init_logging(base.verbose);

    match print_schedules(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", Red.bold().paint("error"));

            ExitCode::FAILURE
        }
    }
}

fn print_schedules(options: &PipelineOptions) -> Result<(), PipelineError> {
    let schedule = Schedule::default();
    let mut registry = PassRegistry::with_builtins();
    let shared = Rc::clone(&schedule);

    registry.register_transforms_with(move |kind| {
        Box::new(RecordingPass {
            kind,
            schedule: Rc::clone(&shared),
        })
    });

    let mut module = Module::new("schedule");

    pipeline::run_diagnostic_passes(&mut module, options, &registry)?;
    print_schedule("diagnostic", &schedule.take());

    pipeline::run_optimization_passes(&mut module, options, &registry)?;
    print_schedule("optimization", &schedule.take());

    Ok(())
}

fn print_schedule(name: &str, passes: &[PassKind]) {
    let header = Green.bold().paint(format!("{name} pipeline"));
    let count = Blue.paint(passes.len().to_string());

    println!("{header} ({count} passes)");

    for (i, kind) in passes.iter().enumerate() {
        println!("{:5}. {}", i + 1, White.paint(kind.name()));
    }
}
