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
use crate::pass::{AnalysisCache, ModuleTransformPass, PassError, PassKind, PreservedAnalyses};
use std::fmt::Write as _;
use std::io;

/// The number of instructions in each function of a module.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InstructionCounts {
    /// `(function name, instruction count)` for every function, in module order.
    pub per_function: Vec<(String, usize)>,
    /// The sum over every function.
    pub total: usize,
}

/// Counts the instructions of every function in a module without
/// modifying it. Declarations count as zero.
pub fn count_instructions(module: &Module) -> InstructionCounts {
    let per_function: Vec<_> = module
        .functions()
        .map(|func| {
            let func = module.function(func);

            (func.name().to_owned(), func.inst_count())
        })
        .collect();

    InstructionCounts {
        total: per_function.iter().map(|(_, count)| count).sum(),
        per_function,
    }
}

fn write_error(pass: &str, err: io::Error) -> PassError {
    PassError::Internal(format!("`{pass}` was unable to write its output: {err}"))
}

/// Reports the number of instructions in each function to a given stream.
///
/// This never modifies the module and preserves every analysis.
pub struct InstCountPass {
    out: Box<dyn io::Write>,
}

impl InstCountPass {
    /// Shorthand for a reporter that prints to [`std::io::stdout`].
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Shorthand for a reporter that prints to [`std::io::stderr`].
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Creates an instance of the pass with a given writer.
    pub fn with_writer<T: io::Write + 'static>(writer: T) -> Self {
        Self {
            out: Box::new(writer),
        }
    }
}

impl ModuleTransformPass for InstCountPass {
    fn kind(&self) -> PassKind {
        PassKind::InstCount
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        PreservedAnalyses::all()
    }

    fn run(&mut self, module: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        let counts = count_instructions(module);
        let mut report = format!("instruction counts for `{}`:\n", module.name());

        for (name, count) in counts.per_function.iter() {
            let _ = writeln!(report, "  {name}: {count}");
        }

        let _ = writeln!(report, "  total: {}", counts.total);

        log::info!("`{}` has {} instructions", module.name(), counts.total);

        self.out
            .write_all(report.as_bytes())
            .map_err(|e| write_error(self.name(), e))
    }
}

/// Writes the control-flow graph of every defined function to a given
/// stream, as one Graphviz `digraph` per function.
///
/// This never modifies the module and preserves every analysis.
pub struct CfgPrinterPass {
    out: Box<dyn io::Write>,
}

impl CfgPrinterPass {
    /// Shorthand for a printer that prints to [`std::io::stdout`].
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Shorthand for a printer that prints to [`std::io::stderr`].
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Creates an instance of the pass with a given writer.
    pub fn with_writer<T: io::Write + 'static>(writer: T) -> Self {
        Self {
            out: Box::new(writer),
        }
    }
}

impl ModuleTransformPass for CfgPrinterPass {
    fn kind(&self) -> PassKind {
        PassKind::CfgPrinter
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        PreservedAnalyses::all()
    }

    fn run(&mut self, module: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        let dot = stringify_cfg(module);

        self.out
            .write_all(dot.as_bytes())
            .map_err(|e| write_error(self.name(), e))
    }
}

/// Renders the control-flow graph of every defined function as Graphviz.
pub fn stringify_cfg(module: &Module) -> String {
    let mut dot = String::default();

    for func in module.functions() {
        let func = module.function(func);
        let body = match func.body() {
            Some(body) => body,
            None => continue,
        };

        let _ = writeln!(dot, "digraph \"{}\" {{", func.name());

        for bb in body.blocks() {
            let block = body.block(bb);

            let _ = writeln!(
                dot,
                "    \"{}\" [label=\"{} ({} insts)\"];",
                block.name(),
                block.name(),
                block.insts().len()
            );

            for succ in body.successors(bb) {
                let target = if body.contains(succ) {
                    body.block(succ).name()
                } else {
                    "<invalid>"
                };

                let _ = writeln!(dot, "    \"{}\" -> \"{target}\";", block.name());
            }
        }

        dot.push_str("}\n");
    }

    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FuncAttributes, Linkage};
    use std::cell::RefCell;
    use std::rc::Rc;

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

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn module() -> Module {
        let mut module = Module::new("m");
        module.declare_function("g", Linkage::Public, FuncAttributes::default());

        let mut b = module.define_function("f", Linkage::Public, FuncAttributes::default());
        let entry = b.create_block("entry");
        let exit = b.create_block("exit");

        b.switch_to(entry);
        b.compute("add");
        b.call("g");
        b.br(exit);
        b.switch_to(exit);
        b.ret();

        module
    }

    #[test]
    fn counts_do_not_mutate() {
        let mut module = module();
        let before = format!("{module:?}");
        let buffer = SharedBuffer::default();

        InstCountPass::with_writer(buffer.clone())
            .run(&mut module, &AnalysisCache::new())
            .unwrap();

        assert_eq!(format!("{module:?}"), before);
        assert_eq!(
            buffer.contents(),
            "instruction counts for `m`:\n  g: 0\n  f: 4\n  total: 4\n"
        );
        assert_eq!(count_instructions(&module).total, 4);
    }

    #[test]
    fn cfg_is_graphviz() {
        let mut module = module();
        let buffer = SharedBuffer::default();

        CfgPrinterPass::with_writer(buffer.clone())
            .run(&mut module, &AnalysisCache::new())
            .unwrap();

        let dot = buffer.contents();

        assert!(dot.starts_with("digraph \"f\" {\n"));
        assert!(dot.contains("    \"entry\" -> \"exit\";\n"));
        assert!(dot.contains("\"exit\" [label=\"exit (1 insts)\"];"));
        assert!(dot.ends_with("}\n"));
    }
}
