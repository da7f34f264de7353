//! Lazy enumeration of transformed tensor index spaces.
//!
//! Windowed operators such as slicing, padding and pooling read their input
//! through a view that is sliced, strided, dilated, padded or transposed. A
//! [`CoordinateTransform`] describes such a view without materializing it. It
//! enumerates the coordinates of the view (the target space) and maps each one
//! back to the underlying tensor (the source), reporting coordinates that fall
//! in padding or between dilated elements so that callers can substitute a
//! fill value.
//!
//! ```
//! use tensor_ir_coord::CoordinateTransform;
//!
//! let transform = CoordinateTransform::new(&[2, 3]);
//! let coords: Vec<Vec<usize>> = transform.iter().map(|c| c.to_vec()).collect();
//! assert_eq!(coords[..3], [vec![0, 0], vec![0, 1], vec![0, 2]]);
//! assert_eq!(coords.len(), 6);
//! ```

mod coordinates;
mod errors;
mod transform;

pub use coordinates::Coordinates;
pub use errors::TransformError;
pub use transform::{
    padded_dilated_extent, Coordinate, CoordinateTransform, SourceCoordinate, TransformBuilder,
};
