//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Contains utility code specifically for the CLI tools located in
//! the `tools/` subdirectory.
//!
//! All of these tools have similar command-line arguments and they all
//! should look/feel uniform, so most of the code is pulled into this
//! module and then used in the drivers of the different tools.

use crate::pipeline::PipelineOptions;
use bpaf::{construct, OptionParser, Parser};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Basic options that every CLI tool in the suite takes in.
pub struct BaseOptions {
    /// Whether or not to run the logging in verbose mode.
    pub verbose: bool,
}

/// Returns a [`OptionParser`] preconfigured with the standard options and
/// additional tool-specific options.
pub fn tool_with<T>(
    description: &'static str,
    additional: impl Parser<T> + 'static,
) -> OptionParser<(T, BaseOptions)> {
    let res = construct!(additional, default());

    res.to_options().descr(description).version(VERSION)
}

/// Gets the baseline default options that every tool needs.
pub fn default() -> impl Parser<BaseOptions> {
    let verbose = verbose();

    construct!(BaseOptions { verbose })
}

/// Checks for the presence of `-v` or `--verbose`
pub fn verbose() -> impl Parser<bool> {
    bpaf::long("verbose")
        .short('v')
        .help("enable verbose output")
        .flag(true, false)
}

/// Gets the pipeline configuration from its individual flags.
pub fn pipeline_options() -> impl Parser<PipelineOptions> {
    let debug_serialization = bpaf::long("debug-serialization")
        .help("only run the passes required to serialize the module")
        .flag(true, false);
    let enable_function_signature_opts = bpaf::long("func-sig-opts")
        .help("enable function signature optimization")
        .flag(true, false);
    let print_instruction_counts = bpaf::long("print-inst-counts")
        .help("report instruction counts after optimizing")
        .flag(true, false);
    let enable_cfg_view = bpaf::long("view-cfg")
        .help("print the control-flow graph of every function after optimizing")
        .flag(true, false);

    construct!(PipelineOptions {
        debug_serialization,
        enable_function_signature_opts,
        print_instruction_counts,
        enable_cfg_view,
    })
}

/// Initializes logging for a tool. `RUST_LOG` takes priority over `verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
