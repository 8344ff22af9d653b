/// Heightmap mesh generation: pixel luminance becomes vertex elevation
use std::time::Instant;

use log::{info, warn};
use nalgebra::{Matrix4, Point2, Point3};

use crate::geometry::IndexedMesh;
use crate::grid::PixelGrid;

/// Builds an [`IndexedMesh`] with one vertex per pixel.
///
/// Vertex `y * width + x` sits at `(x, y, height_scale * luminance / 255)`.
/// Each cell with top-left pixel `a = (x, y)` and neighbours
/// `b = (x+1, y)`, `c = (x+1, y+1)`, `d = (x, y+1)` becomes the triangles
/// `(a, b, c)` and `(a, c, d)`. Facing is left to the consumer.
#[derive(Debug, Clone)]
pub struct HeightmapMeshBuilder {
    height_scale: f32,
    generate_uvs: bool,
    colors: bool,
    transform: Option<Matrix4<f32>>,
}

impl HeightmapMeshBuilder {
    /// `height_scale` is the elevation given to luminance 255. Zero gives a
    /// flat mesh.
    pub fn new(height_scale: f32) -> Self {
        Self {
            height_scale,
            generate_uvs: false,
            colors: false,
            transform: None,
        }
    }

    /// UV `(x / width, y / height)` for each vertex
    pub fn with_uvs(mut self, generate_uvs: bool) -> Self {
        self.generate_uvs = generate_uvs;
        self
    }

    /// Record the color of each cell's top-left pixel for both its triangles
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Applied to positions after generation; topology and UVs are unaffected
    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn build(&self, grid: &PixelGrid) -> IndexedMesh {
        if grid.is_empty() {
            if grid.pixel_count() > 0 {
                warn!(
                    "Heightmap requested for a {}x{} grid without pixel data",
                    grid.width(),
                    grid.height()
                );
            }
            return IndexedMesh::new();
        }

        let width = grid.width() as usize;
        let height = grid.height() as usize;
        let cells = width.saturating_sub(1) * height.saturating_sub(1);

        info!("Heightmap mesh: {} pixels ({}x{})", width * height, width, height);
        let start = Instant::now();

        let mut mesh = IndexedMesh::with_capacity(width * height, cells * 2);
        let step_z = self.height_scale / 255.0;
        for (y, row) in grid.rows().enumerate() {
            for (x, color) in row.iter().enumerate() {
                let z = step_z * f32::from(color.luminance());
                mesh.vertices.push(Point3::new(x as f32, y as f32, z));
            }
        }

        if self.generate_uvs {
            let (w, h) = (width as f32, height as f32);
            mesh.uvs.reserve_exact(width * height);
            for y in 0..height {
                for x in 0..width {
                    mesh.uvs.push(Point2::new(x as f32 / w, y as f32 / h));
                }
            }
        }
        info!("> Generating points took: {:?}", start.elapsed());

        let t = Instant::now();
        if self.colors {
            mesh.colors.reserve_exact(cells * 2);
        }
        for y in 0..height.saturating_sub(1) {
            let row = y * width;
            for x in 0..width - 1 {
                let a = row + x;
                let b = a + 1;
                let c = b + width;
                let d = a + width;
                mesh.triangles.push([a, b, c]);
                mesh.triangles.push([a, c, d]);

                if self.colors {
                    let color = grid.pixels()[a];
                    mesh.colors.push(color);
                    mesh.colors.push(color);
                }
            }
        }
        info!(
            "> Triangulating {} triangles took: {:?}",
            mesh.triangle_count(),
            t.elapsed()
        );

        if let Some(transform) = &self.transform {
            mesh.apply_transform(transform);
        }

        info!("Heightmap total time: {:?}", start.elapsed());
        mesh
    }
}

impl Default for HeightmapMeshBuilder {
    fn default() -> Self {
        Self::new(0.0)
    }
}
