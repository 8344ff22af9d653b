/// Pixel mosaics: one flat colored quad per pixel
use log::info;
use nalgebra::{Matrix4, Point3};

use crate::color::Color;
use crate::geometry::IndexedMesh;
use crate::grid::PixelGrid;

/// A unit square covering one pixel. Corners run counter-clockwise seen
/// from +Z, so the front face points up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicQuad {
    pub corners: [Point3<f32>; 4],
    pub color: Color,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mosaic {
    pub quads: Vec<MosaicQuad>,
}

impl Mosaic {
    /// Transform every corner
    pub fn with_transform(mut self, transform: &Matrix4<f32>) -> Self {
        for quad in &mut self.quads {
            for corner in &mut quad.corners {
                *corner = transform.transform_point(corner);
            }
        }
        self
    }

    /// Split each quad into two triangles carrying the quad's color.
    /// Corners are not shared between quads.
    pub fn to_indexed_mesh(&self) -> IndexedMesh {
        let mut mesh = IndexedMesh::with_capacity(self.quads.len() * 4, self.quads.len() * 2);
        mesh.colors.reserve_exact(self.quads.len() * 2);
        for quad in &self.quads {
            let base = mesh.vertices.len();
            mesh.vertices.extend_from_slice(&quad.corners);
            mesh.triangles.push([base, base + 1, base + 2]);
            mesh.triangles.push([base, base + 2, base + 3]);
            mesh.colors.push(quad.color);
            mesh.colors.push(quad.color);
        }
        mesh
    }
}

/// Lay out one quad per pixel in row-major order
pub fn build_mosaic(grid: &PixelGrid) -> Mosaic {
    let mut quads = Vec::with_capacity(grid.pixels().len());
    for (y, row) in grid.rows().enumerate() {
        let y = y as f32;
        for (x, &color) in row.iter().enumerate() {
            let x = x as f32;
            quads.push(MosaicQuad {
                corners: [
                    Point3::new(x, y, 0.0),
                    Point3::new(x + 1.0, y, 0.0),
                    Point3::new(x + 1.0, y + 1.0, 0.0),
                    Point3::new(x, y + 1.0, 0.0),
                ],
                color,
            });
        }
    }
    info!("Mosaic: {} quads ({}x{})", quads.len(), grid.width(), grid.height());
    Mosaic { quads }
}
