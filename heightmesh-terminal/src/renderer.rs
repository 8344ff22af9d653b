/// ASCII rasterizer for terminal previews of indexed meshes
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use heightmesh_core::{Camera, IndexedMesh};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// A rasterised cell: glyph plus optional true-color tint
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    tint: Option<heightmesh_core::Color>,
}

const EMPTY: Cell = Cell {
    glyph: ' ',
    tint: None,
};

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![EMPTY; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(EMPTY);
    }

    pub fn render_mesh(&mut self, mesh: &IndexedMesh, model_matrix: &Matrix4<f32>, camera: &Camera) {
        let mvp = camera.projection_matrix() * camera.view_matrix() * model_matrix;
        let light_dir = Vector3::new(0.3, 0.5, 1.0).normalize();

        for triangle in 0..mesh.triangle_count() {
            let mut screen = [(0.0, 0.0, 0.0); 3];
            let mut clipped = false;
            for (slot, position) in screen.iter_mut().zip(mesh.triangle_positions(triangle)) {
                match camera.project_with(&mvp, &position, self.width as u32, self.height as u32) {
                    Some(coords) => *slot = coords,
                    None => clipped = true,
                }
            }
            if clipped {
                continue;
            }

            // Winding is not guaranteed, so light both sides alike
            let normal = model_matrix.transform_vector(&mesh.face_normal(triangle));
            let brightness = normal.dot(&light_dir).abs().clamp(0.0, 1.0);

            let ramp = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
            // Keep faint faces visible
            let glyph = LUMINOSITY_RAMP[ramp.clamp(1, LUMINOSITY_RAMP.len() - 1)];
            let cell = Cell {
                glyph,
                tint: mesh.triangle_color(triangle),
            };

            self.rasterize_triangle(&screen, cell);
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], cell: Cell) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.cells[idx] = cell;
                        }
                    }
                }
            }
        }
    }

    /// Number of cells any triangle was drawn into
    pub fn covered_cells(&self) -> usize {
        self.depth_buffer.iter().filter(|d| d.is_finite()).count()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.cells.chunks(self.width.max(1)) {
            for cell in row {
                let color = match cell.tint {
                    Some(c) => Color::Rgb {
                        r: c.r,
                        g: c.g,
                        b: c.b,
                    },
                    None => ramp_color(cell.glyph),
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(cell.glyph))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn ramp_color(glyph: char) -> Color {
    match glyph {
        ' ' | '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        '#' | '%' | '@' => Color::Cyan,
        _ => Color::White,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
