//! Two-pass prompt build.
//!
//! Pass one ([`extend`]) walks the AST and extrudes a database of
//! literal prompt variants plus the interpolation axes relating them.
//! Pass two ([`eval`]) reduces the resulting tensor to one conditioning
//! per sampling step.

pub mod axis;
pub mod builder;
pub mod eval;
pub mod extend;

pub use axis::{Axis, InterpolationParams, Interpolator};
pub use builder::{IndexTensor, TensorBuilder};
pub use eval::{CondTensor, InterpolationTensor, LeafSchedule, ScheduledCond};
pub use extend::StepsRange;
