//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::builtin_analysis;
use crate::pass::{AnalysisKind, ModuleTransformPass, PassKind, PipelineError, RegisteredAnalysis};
use crate::transforms::builtin_transform;
use crate::utility::SaHashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

type TransformFactory = Rc<dyn Fn(PassKind) -> Box<dyn ModuleTransformPass>>;
type AnalysisFactory = Rc<dyn Fn() -> RegisteredAnalysis>;

/// The table that pipelines get their passes from.
///
/// Pipeline builders only name the passes they want, the registry decides
/// what actually gets scheduled under each name. Every scheduled pass is a
/// fresh instance created by the factory registered for its kind.
///
/// ```
/// # use lapis::pipeline::*;
/// # use lapis::pass::*;
/// # use lapis::transforms::*;
/// let mut registry = PassRegistry::with_builtins();
///
/// // quiet down the reporter
/// registry.register_transform(PassKind::InstCount, |_| Box::new(InstCountPass::with_writer(std::io::sink())));
///
/// assert!(registry.create(PassKind::InstCount).is_ok());
/// ```
#[derive(Clone, Default)]
pub struct PassRegistry {
    transforms: SaHashMap<PassKind, TransformFactory>,
    analyses: SaHashMap<AnalysisKind, AnalysisFactory>,
}

impl PassRegistry {
    /// Creates a registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in implementation of every
    /// analysis and transform kind.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        registry.register_transforms_with(builtin_transform);

        for kind in AnalysisKind::ALL {
            registry.register_analysis(kind, move || builtin_analysis(kind));
        }

        registry
    }

    /// Registers the factory for a single transform kind, replacing any
    /// factory that was already registered for it.
    ///
    /// The factory is given the kind it is being asked to create.
    pub fn register_transform<F>(&mut self, kind: PassKind, factory: F)
    where
        F: Fn(PassKind) -> Box<dyn ModuleTransformPass> + 'static,
    {
        self.transforms.insert(kind, Rc::new(factory));
    }

    /// Registers one factory for every transform kind of the catalogue.
    pub fn register_transforms_with<F>(&mut self, factory: F)
    where
        F: Fn(PassKind) -> Box<dyn ModuleTransformPass> + 'static,
    {
        let factory: TransformFactory = Rc::new(factory);

        for &kind in PassKind::ALL {
            self.transforms.insert(kind, Rc::clone(&factory));
        }
    }

    /// Registers the factory for an analysis kind, replacing any factory
    /// that was already registered for it.
    pub fn register_analysis<F>(&mut self, kind: AnalysisKind, factory: F)
    where
        F: Fn() -> RegisteredAnalysis + 'static,
    {
        self.analyses.insert(kind, Rc::new(factory));
    }

    /// Creates a fresh instance of a transform.
    pub fn create(&self, kind: PassKind) -> Result<Box<dyn ModuleTransformPass>, PipelineError> {
        let factory = self
            .transforms
            .get(&kind)
            .ok_or(PipelineError::UnregisteredPass(kind))?;

        Ok(factory(kind))
    }

    /// Creates a fresh instance of an analysis.
    pub fn create_analysis(&self, kind: AnalysisKind) -> Result<RegisteredAnalysis, PipelineError> {
        let factory = self
            .analyses
            .get(&kind)
            .ok_or(PipelineError::UnregisteredAnalysis(kind))?;

        Ok(factory())
    }

    /// Checks if a transform kind has a factory.
    pub fn has_transform(&self, kind: PassKind) -> bool {
        self.transforms.contains_key(&kind)
    }

    /// Checks if an analysis kind has a factory.
    pub fn has_analysis(&self, kind: AnalysisKind) -> bool {
        self.analyses.contains_key(&kind)
    }
}

impl Debug for PassRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut transforms: Vec<_> = self.transforms.keys().copied().collect();
        let mut analyses: Vec<_> = self.analyses.keys().copied().collect();

        transforms.sort();
        analyses.sort();

        f.debug_struct("PassRegistry")
            .field("transforms", &transforms)
            .field("analyses", &analyses)
            .finish()
    }
}
