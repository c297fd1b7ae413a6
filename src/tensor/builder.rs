//! Prompt database construction.
//!
//! The first build pass walks the AST and appends literal text to a
//! database of prompt variants. Interpolation constructs *extrude* the
//! database: every branch gets its own copy of everything written so
//! far, extends it independently, and the copies are stitched back
//! together under a new axis. Later appends land in every variant, so
//! text after a bracket distributes across all of its branches.

use super::axis::{Axis, Interpolator};
use super::eval::{CondTensor, InterpolationTensor, LeafSchedule};
use crate::dsl::error::CompileError;

const MAX_SUBSTITUTION_DEPTH: usize = 64;

/// Tree of database indices mirroring the axis branch structure.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexTensor {
    Leaf(usize),
    Nested(Vec<IndexTensor>),
}

impl IndexTensor {
    fn offset(&mut self, by: usize) {
        match self {
            IndexTensor::Leaf(index) => *index += by,
            IndexTensor::Nested(children) => {
                for child in children {
                    child.offset(by);
                }
            }
        }
    }
}

pub struct TensorBuilder {
    database: Vec<String>,
    indices: IndexTensor,
    axes: Vec<Axis>,
    depth: usize,
}

impl TensorBuilder {
    pub fn new() -> Self {
        Self {
            database: vec![String::new()],
            indices: IndexTensor::Leaf(0),
            axes: Vec::new(),
            depth: 0,
        }
    }

    pub fn prompt_database(&self) -> &[String] {
        &self.database
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn indices(&self) -> &IndexTensor {
        &self.indices
    }

    /// Append literal text to every variant built so far.
    pub fn append(&mut self, text: &str) {
        for entry in &mut self.database {
            entry.push_str(text);
        }
    }

    /// Fork the database into `branches` copies, extend each copy
    /// through `extend_branch`, and stitch the results back together
    /// under a new axis. The new axis is outermost: it wraps everything
    /// built before it.
    pub fn extrude(
        &mut self,
        branches: usize,
        interpolator: Interpolator,
        mut extend_branch: impl FnMut(usize, &mut TensorBuilder) -> Result<(), CompileError>,
    ) -> Result<(), CompileError> {
        let mut database = Vec::new();
        let mut indices = Vec::new();
        let mut nested = Vec::new();
        for branch in 0..branches {
            let mut fork = TensorBuilder {
                database: self.database.clone(),
                indices: self.indices.clone(),
                axes: Vec::new(),
                depth: self.depth,
            };
            extend_branch(branch, &mut fork)?;
            fork.indices.offset(database.len());
            database.extend(fork.database);
            indices.push(fork.indices);
            nested.push(fork.axes);
        }
        self.database = database;
        self.indices = IndexTensor::Nested(indices);
        self.axes.insert(
            0,
            Axis {
                interpolator,
                nested,
            },
        );
        Ok(())
    }

    /// A fresh single-variant builder sharing this one's substitution
    /// depth, for evaluating embedded numeric expressions.
    pub fn scratch(&self) -> TensorBuilder {
        TensorBuilder {
            database: vec![String::new()],
            indices: IndexTensor::Leaf(0),
            axes: Vec::new(),
            depth: self.depth,
        }
    }

    pub fn enter(&mut self, name: &str) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_SUBSTITUTION_DEPTH {
            return Err(CompileError::eval(
                format!("substitution depth exceeded expanding '${name}'"),
                0,
                0,
            ));
        }
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Pair the index tensor with per-entry schedules to produce the
    /// final blending plan.
    pub fn build(&self, schedules: &[LeafSchedule]) -> InterpolationTensor {
        InterpolationTensor::new(map_leaves(&self.indices, schedules), self.axes.clone())
    }
}

impl Default for TensorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn map_leaves(indices: &IndexTensor, schedules: &[LeafSchedule]) -> CondTensor {
    match indices {
        IndexTensor::Leaf(index) => {
            CondTensor::Leaf(schedules.get(*index).cloned().unwrap_or_default())
        }
        IndexTensor::Nested(children) => CondTensor::Nested(
            children
                .iter()
                .map(|child| map_leaves(child, schedules))
                .collect(),
        ),
    }
}
