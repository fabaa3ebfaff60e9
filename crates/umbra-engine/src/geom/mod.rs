//! Region geometry: path model, curve flattening, fill triangulation and stroking.
//!
//! Everything here is CPU-side and backend-agnostic. Builders own their output
//! buffers and hand out borrows that are valid until the next call.

pub mod flatten;
pub mod mesh;
pub mod path;
pub mod stroke;
pub mod triangulate;

pub use flatten::{Flattener, SubPath, SubPathSpan, POINTS_PER_CURVE};
pub use mesh::Mesh;
pub use path::{PathCmd, Region};
pub use stroke::{estimate_circle_sides, Join, PathStroker};
pub use triangulate::{contains_point, signed_area, AreaTriangulator};
