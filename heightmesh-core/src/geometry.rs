/// Indexed triangle meshes produced by the heightmap and mosaic builders
use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::color::Color;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// Vertex positions, optional UVs and triangle index triples.
///
/// `uvs` is either empty or aligned 1:1 with `vertices`. `colors` is either
/// empty or holds one color per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<Point3<f32>>,
    pub uvs: Vec<Point2<f32>>,
    pub triangles: Vec<[usize; 3]>,
    pub colors: Vec<Color>,
}

impl IndexedMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            uvs: Vec::new(),
            triangles: Vec::with_capacity(triangles),
            colors: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn triangle_color(&self, triangle: usize) -> Option<Color> {
        self.colors.get(triangle).copied()
    }

    pub fn triangle_positions(&self, triangle: usize) -> [Point3<f32>; 3] {
        let [a, b, c] = self.triangles[triangle];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Unit normal following the triangle's winding. Degenerate triangles
    /// give a zero vector.
    pub fn face_normal(&self, triangle: usize) -> Vector3<f32> {
        let [v0, v1, v2] = self.triangle_positions(triangle);
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.vertices.first()?;
        let bounds = self.vertices.iter().fold(
            Bounds {
                min: first,
                max: first,
            },
            |acc, p| Bounds {
                min: acc.min.inf(p),
                max: acc.max.sup(p),
            },
        );
        Some(bounds)
    }

    /// Transform every position in place. UVs are left alone.
    pub fn apply_transform(&mut self, transform: &Matrix4<f32>) {
        for vertex in &mut self.vertices {
            *vertex = transform.transform_point(vertex);
        }
    }

    /// Every index refers to an existing vertex
    pub fn is_valid(&self) -> bool {
        let count = self.vertices.len();
        self.triangles.iter().flatten().all(|&i| i < count)
            && (self.uvs.is_empty() || self.uvs.len() == count)
            && (self.colors.is_empty() || self.colors.len() == self.triangles.len())
    }
}
