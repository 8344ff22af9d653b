/// Heightmesh Web - WASM entry points for building meshes from BMP bytes
///
/// Meshes cross the boundary as flat arrays so they can be handed straight
/// to WebGL/WebGPU buffers.
use heightmesh_core::{build_mosaic, BmpDecoder, BmpError, HeightmapMeshBuilder, IndexedMesh};
use log::debug;
use wasm_bindgen::prelude::*;

/// Flat mesh buffers: `positions` is xyz per vertex, `uvs` is uv per vertex
/// (empty when not requested), `indices` is three per triangle and `colors`
/// is rgb per triangle.
#[wasm_bindgen]
#[derive(Debug, Clone, Default)]
pub struct WebMesh {
    positions: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u32>,
    colors: Vec<u8>,
}

#[wasm_bindgen]
impl WebMesh {
    #[wasm_bindgen(getter)]
    pub fn positions(&self) -> Vec<f32> {
        self.positions.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn uvs(&self) -> Vec<f32> {
        self.uvs.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> Vec<u32> {
        self.indices.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn colors(&self) -> Vec<u8> {
        self.colors.clone()
    }

    #[wasm_bindgen(getter, js_name = vertexCount)]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[wasm_bindgen(getter, js_name = triangleCount)]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl From<&IndexedMesh> for WebMesh {
    fn from(mesh: &IndexedMesh) -> Self {
        Self {
            positions: mesh.vertices.iter().flat_map(|p| [p.x, p.y, p.z]).collect(),
            uvs: mesh.uvs.iter().flat_map(|uv| [uv.x, uv.y]).collect(),
            // WebGL index buffers are 32-bit
            indices: mesh.triangles.iter().flatten().map(|&i| i as u32).collect(),
            colors: mesh.colors.iter().flat_map(|c| c.to_rgb()).collect(),
        }
    }
}

fn heightmap_mesh(bytes: &[u8], height_scale: f32, generate_uvs: bool) -> Result<WebMesh, BmpError> {
    let grid = BmpDecoder::new().decode(bytes)?;
    debug!("Decoded {}x{} bitmap", grid.width(), grid.height());
    let mesh = HeightmapMeshBuilder::new(height_scale)
        .with_uvs(generate_uvs)
        .with_colors(true)
        .build(&grid);
    Ok(WebMesh::from(&mesh))
}

fn mosaic_mesh(bytes: &[u8]) -> Result<WebMesh, BmpError> {
    let grid = BmpDecoder::new().decode(bytes)?;
    Ok(WebMesh::from(&build_mosaic(&grid).to_indexed_mesh()))
}

/// Decode a BMP and build a heightmap mesh from it
#[wasm_bindgen(js_name = heightmapFromBmp)]
pub fn heightmap_from_bmp(bytes: &[u8], height_scale: f32, generate_uvs: bool) -> Result<WebMesh, JsValue> {
    heightmap_mesh(bytes, height_scale, generate_uvs).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decode a BMP and build a flat per-pixel mosaic from it
#[wasm_bindgen(js_name = mosaicFromBmp)]
pub fn mosaic_from_bmp(bytes: &[u8]) -> Result<WebMesh, JsValue> {
    mosaic_mesh(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}
