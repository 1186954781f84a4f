use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use super::{build_pipe_curve, Curve};
use crate::config::CurveConfig;
use crate::error::{Error, Result};
use crate::scene::{PipeDirection, PipeId, SpatialTree};

/// Built pipe curves keyed by pipe and direction of travel.
///
/// Pipes never change after a tree is built, so entries live until [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct PipeCurveCache {
    curves: HashMap<(PipeId, PipeDirection), Curve>,
}

impl PipeCurveCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn get(&self, pipe: PipeId, direction: PipeDirection) -> Option<&Curve> {
        self.curves.get(&(pipe, direction))
    }

    pub fn get_or_build(
        &mut self,
        tree: &SpatialTree,
        pipe: PipeId,
        direction: PipeDirection,
        config: &CurveConfig,
    ) -> Result<&Curve> {
        match self.curves.entry((pipe, direction)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let resolved = tree.pipe(pipe).ok_or(Error::UnknownPipe(pipe.0))?;
                let curve = build_pipe_curve(tree, resolved, direction, config)?;
                Ok(entry.insert(curve))
            }
        }
    }

    /// Builds both directions of every pipe in `tree`.
    pub fn build_all(&mut self, tree: &SpatialTree, config: &CurveConfig) -> Result<()> {
        for pipe in tree.pipes() {
            for direction in [PipeDirection::Forward, PipeDirection::Backward] {
                self.get_or_build(tree, pipe.id, direction, config)?;
            }
        }
        debug!(curves = self.curves.len(), "pipe curves built");
        Ok(())
    }

    pub fn clear(&mut self) {
        self.curves.clear();
    }
}
