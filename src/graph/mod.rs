//! Graph algorithms over the derived [GraphView] of a skeleton.
//!
//! Everything in here is read-only: functions take a [GraphView] and arena
//! indices ([VertexIndex]) and return derived data. The id-based wrappers
//! on [Skeleton](crate::model::Skeleton) translate node ids and handle
//! caching.
//!
//! | Module | Provides |
//! |------|---------------|
//! | [view] | [GraphView] arena, traversal iterators, petgraph export |
//! | [classify] | root/branch/slab/end classification |
//! | [segments] | small and long segments |
//! | [geodesic] | geodesic matrix, distal/proximal relation, paths |
//! | [strahler] | Strahler order |

pub mod classify;
pub mod geodesic;
pub mod segments;
pub mod strahler;
pub mod view;

pub use classify::classify;
pub use geodesic::{EdgeWeight, GeodesicMatrix, GeodesicOptions};
pub use segments::{Segment, SegmentWeight};
pub use strahler::StrahlerMethod;
pub use view::{GraphView, VertexIndex};
