//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The module-wide options that the pipeline drivers consult.
///
/// Drivers only ever read these, the same value can be reused for any
/// number of invocations.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "enable-serde", serde(default))]
pub struct PipelineOptions {
    /// Only run the bare minimum of passes, so that the module that gets
    /// serialized is as close as possible to what was generated.
    pub debug_serialization: bool,
    /// Run the function signature optimization while lowering.
    pub enable_function_signature_opts: bool,
    /// Report the instruction count of every function after optimizing.
    pub print_instruction_counts: bool,
    /// Print the control-flow graph of every function after optimizing.
    pub enable_cfg_view: bool,
}

impl PipelineOptions {
    /// Options with every flag turned off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables debug-serialization mode.
    pub fn with_debug_serialization(self, enabled: bool) -> Self {
        Self {
            debug_serialization: enabled,
            ..self
        }
    }

    /// Enables or disables function signature optimization.
    pub fn with_function_signature_opts(self, enabled: bool) -> Self {
        Self {
            enable_function_signature_opts: enabled,
            ..self
        }
    }

    /// Enables or disables instruction count reporting.
    pub fn with_instruction_counts(self, enabled: bool) -> Self {
        Self {
            print_instruction_counts: enabled,
            ..self
        }
    }

    /// Enables or disables the control-flow graph viewer.
    pub fn with_cfg_view(self, enabled: bool) -> Self {
        Self {
            enable_cfg_view: enabled,
            ..self
        }
    }
}
