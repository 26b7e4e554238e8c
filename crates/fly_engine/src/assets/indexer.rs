//! Vertex de-duplication
//!
//! Corners that share position, texture coordinate and normal bit for bit
//! collapse into one vertex. Their tangents and bitangents are summed, which
//! averages the frames of the triangles meeting there once the shader
//! normalises them.

use std::collections::HashMap;

use crate::assets::{TangentFrames, TriangleSoup};

/// Indexed mesh ready for upload, one entry per unique vertex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Texture coordinates
    pub uvs: Vec<[f32; 2]>,
    /// Normals
    pub normals: Vec<[f32; 3]>,
    /// Tangents
    pub tangents: Vec<[f32; 3]>,
    /// Bitangents
    pub bitangents: Vec<[f32; 3]>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of unique vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[derive(PartialEq, Eq, Hash)]
struct VertexKey([u32; 8]);

impl VertexKey {
    fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) -> Self {
        let [px, py, pz] = position.map(f32::to_bits);
        let [u, v] = uv.map(f32::to_bits);
        let [nx, ny, nz] = normal.map(f32::to_bits);
        Self([px, py, pz, u, v, nx, ny, nz])
    }
}

/// Build an indexed mesh from unindexed triangles and their tangent frames
pub fn index_triangles(soup: &TriangleSoup, frames: &TangentFrames) -> MeshData {
    let mut mesh = MeshData::default();
    let mut seen: HashMap<VertexKey, u32> = HashMap::new();

    for i in 0..soup.positions.len() {
        let (position, uv, normal) = (soup.positions[i], soup.uvs[i], soup.normals[i]);
        let (tangent, bitangent) = (frames.tangents[i], frames.bitangents[i]);

        match seen.get(&VertexKey::new(position, uv, normal)) {
            Some(&index) => {
                let slot = index as usize;
                add_into(&mut mesh.tangents[slot], tangent);
                add_into(&mut mesh.bitangents[slot], bitangent);
                mesh.indices.push(index);
            }
            None => {
                let index = mesh.positions.len() as u32;
                mesh.positions.push(position);
                mesh.uvs.push(uv);
                mesh.normals.push(normal);
                mesh.tangents.push(tangent);
                mesh.bitangents.push(bitangent);
                mesh.indices.push(index);
                seen.insert(VertexKey::new(position, uv, normal), index);
            }
        }
    }

    mesh
}

fn add_into(target: &mut [f32; 3], value: [f32; 3]) {
    for (t, v) in target.iter_mut().zip(value) {
        *t += v;
    }
}
