//! Tensor shapes that may be partially unknown.
//!
//! When a graph is built, the shapes of its inputs are often only partly
//! known. A model may declare an image input as `{?,3,?,?}`, where the batch
//! size and image dimensions are only fixed at runtime, or may not declare a
//! shape at all. This crate provides the types used to describe such shapes
//! and to combine them during type checking:
//!
//! - [`Dimension`] is the size of one axis, which may be
//!   [`Dynamic`](Dimension::Dynamic). [`Rank`] is the same type used for the
//!   number of axes.
//! - [`PartialShape`] is a list of dimensions whose rank may be unknown.
//! - [`Shape`] is a fully known shape, obtained from a complete
//!   `PartialShape` via [`PartialShape::to_shape`].
//!
//! # Merging
//!
//! The central operation is [`PartialShape::merge_into`], which combines two
//! descriptions of the same value into the most specific shape consistent
//! with both. Unknown dimensions are filled in from the other side and two
//! known dimensions must agree:
//!
//! ```
//! use tensor_ir_shape::{partial_shape, PartialShape};
//!
//! let a = partial_shape![1, 2, ?, ?];
//! let b = partial_shape![1, ?, 3, ?];
//! assert_eq!(PartialShape::merge(&a, &b), Some(partial_shape![1, 2, 3, ?]));
//!
//! let c = partial_shape![2, ?, ?, ?];
//! assert_eq!(PartialShape::merge(&a, &c), None);
//! ```

mod dimension;
mod errors;
mod partial_shape;
mod shape;

pub use dimension::{Dimension, Rank};
pub use errors::ShapeError;
pub use partial_shape::PartialShape;
pub use shape::{AxisSet, Shape};
