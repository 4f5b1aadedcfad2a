//! Plant Alloc
//!
//! Plant Alloc assigns unsplittable production items to capacity-limited plants. It classifies
//! the input, normalises heterogeneous objective components onto a common integer scale, builds
//! an integer program and decodes the solver's answer into per-item decisions and diagnostics.

pub mod allocator;
pub mod classify;
pub mod fixtures;
pub mod items;
pub mod normalize;
pub mod objectives;
pub mod orders;
pub mod plan;
pub mod plants;
pub mod prelude;
pub mod problem;
pub mod solvers;
pub mod urgency;
pub mod utils;
pub mod weights;
