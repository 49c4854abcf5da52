//! NBLAST similarity scoring for skeletonized 3D neuron reconstructions.
//!
//! A neuron's skeleton is reduced to a [`VectorCloud`]: its sample points plus
//! a unit tangent per point, the principal direction of the point's local
//! neighborhood. Two clouds are compared by matching every query point to its
//! nearest target point and summing a [`ScoreTable`] lookup over the match's
//! (distance, unsigned tangent alignment); [`ScoreMatrix`] batches that over
//! all ordered pairs of a collection. Scores are raw directional sums, higher
//! meaning more similar, and deliberately not normalized here.
//!
//! Tangent sign is arbitrary and carries no meaning; everything downstream
//! compares tangents through `|dot|`.
//!
//! # Example
//!
//! ```
//! use nblast::{score, ScoreMatrix, ScoreTable, VectorCloud};
//!
//! // A tiny synthetic table: distance rows at 0/5/20, alignment columns at 0/1.
//! let table = ScoreTable::new(
//!     vec![0.0, 5.0, 20.0],
//!     vec![0.0, 1.0],
//!     vec![2.0, 6.0, 0.5, 1.5, -1.0, -0.5],
//! )?;
//!
//! // Two parallel 12-point strands, 5 apart.
//! let a: Vec<[f32; 3]> = (0..12).map(|i| [0.0, 0.0, i as f32]).collect();
//! let b: Vec<[f32; 3]> = (0..12).map(|i| [5.0, 0.0, i as f32]).collect();
//! let a = VectorCloud::build(&a)?;
//! let b = VectorCloud::build(&b)?;
//!
//! let forward = score(&a, &b, &table);
//! assert!(forward.is_finite());
//!
//! let matrix = ScoreMatrix::build(&[a, b], &table);
//! assert_eq!(matrix.num_clouds(), 2);
//! assert_eq!(matrix[(0, 1)], forward);
//! # Ok::<(), nblast::NblastError>(())
//! ```

mod cloud;
mod error;
mod index;
mod par;
mod score_table;
mod scoring;
mod types;

pub use cloud::{CloudConfig, PointMatch, VectorCloud};
pub use error::NblastError;
pub use index::{KdTree, SpatialIndex};
pub use score_table::ScoreTable;
pub use scoring::{score, ScoreMatrix};
pub use types::{Point3, Point3Like};
