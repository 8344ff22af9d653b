/// Heightmesh Core Library - bitmap decoding and heightmap mesh generation
///
/// Decodes uncompressed BMP files into pixel grids and turns those grids
/// into indexed triangle meshes: luminance-driven heightmaps or flat
/// per-pixel mosaics. Nothing here depends on a particular host or renderer.

pub mod bmp;
pub mod bmp_encode;
pub mod color;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod heightmap;
pub mod mosaic;
pub mod projection;
pub mod transform;

// Re-export commonly used types
pub use bmp::{decode_bmp, BmpDecoder};
pub use bmp_encode::{encode_bmp, write_bmp};
pub use color::Color;
pub use error::{BmpError, BmpResult, GridError};
pub use geometry::{Bounds, IndexedMesh};
pub use grid::PixelGrid;
pub use heightmap::HeightmapMeshBuilder;
pub use mosaic::{build_mosaic, Mosaic, MosaicQuad};
pub use projection::{Camera, ProjectionMode};
pub use transform::{RotationState, Transform};
