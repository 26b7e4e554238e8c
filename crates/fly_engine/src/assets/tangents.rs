//! Tangent frames for normal mapping
//!
//! Every triangle gets one tangent and bitangent from its position and UV
//! deltas. Each corner's tangent is then made orthogonal to that corner's
//! normal (Gram-Schmidt) and flipped when the frame would be left-handed
//! relative to the bitangent.

use crate::assets::TriangleSoup;
use crate::foundation::math::Vec3;

/// Per-corner tangents and bitangents, parallel to a [`TriangleSoup`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TangentFrames {
    /// Unit tangents, orthogonal to the corner normal
    pub tangents: Vec<[f32; 3]>,
    /// Bitangents as derived from the UV mapping
    pub bitangents: Vec<[f32; 3]>,
}

/// Compute tangent frames for every corner of `soup`
pub fn compute_tangents(soup: &TriangleSoup) -> TangentFrames {
    let mut frames = TangentFrames {
        tangents: Vec::with_capacity(soup.positions.len()),
        bitangents: Vec::with_capacity(soup.positions.len()),
    };

    for (positions, uvs) in soup.positions.chunks_exact(3).zip(soup.uvs.chunks_exact(3)) {
        let [p0, p1, p2] = [positions[0], positions[1], positions[2]].map(Vec3::from);
        let delta_pos1 = p1 - p0;
        let delta_pos2 = p2 - p0;
        let delta_uv1 = [uvs[1][0] - uvs[0][0], uvs[1][1] - uvs[0][1]];
        let delta_uv2 = [uvs[2][0] - uvs[0][0], uvs[2][1] - uvs[0][1]];

        let det = delta_uv1[0] * delta_uv2[1] - delta_uv1[1] * delta_uv2[0];
        // Degenerate UVs: fall back to the triangle's own edges.
        let (tangent, bitangent) = if det.abs() > f32::EPSILON {
            let r = 1.0 / det;
            (
                (delta_pos1 * delta_uv2[1] - delta_pos2 * delta_uv1[1]) * r,
                (delta_pos2 * delta_uv1[0] - delta_pos1 * delta_uv2[0]) * r,
            )
        } else {
            (delta_pos1, delta_pos2)
        };

        for _ in 0..3 {
            frames.tangents.push(tangent.into());
            frames.bitangents.push(bitangent.into());
        }
    }

    for ((tangent, bitangent), normal) in frames.tangents.iter_mut().zip(&frames.bitangents).zip(&soup.normals) {
        *tangent = orthogonalize(Vec3::from(*tangent), Vec3::from(*bitangent), Vec3::from(*normal)).into();
    }

    frames
}

fn orthogonalize(tangent: Vec3, bitangent: Vec3, normal: Vec3) -> Vec3 {
    let projected = tangent - normal * normal.dot(&tangent);
    let Some(mut tangent) = projected.try_normalize(f32::EPSILON) else {
        return any_perpendicular(normal);
    };
    if normal.cross(&tangent).dot(&bitangent) < 0.0 {
        tangent = -tangent;
    }
    tangent
}

fn any_perpendicular(normal: Vec3) -> Vec3 {
    let axis = if normal.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    (axis - normal * normal.dot(&axis)).try_normalize(f32::EPSILON).unwrap_or(axis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_triangle(uvs: [[f32; 2]; 3]) -> TriangleSoup {
        TriangleSoup {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            uvs: uvs.to_vec(),
            normals: vec![[0.0, 0.0, 1.0]; 3],
        }
    }

    #[test]
    fn test_tangent_follows_u_axis() {
        let frames = compute_tangents(&flat_triangle([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]));
        for tangent in &frames.tangents {
            assert_relative_eq!(Vec3::from(*tangent), Vec3::x(), epsilon = 1e-6);
        }
        assert_relative_eq!(Vec3::from(frames.bitangents[0]), Vec3::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_tangent_is_orthogonal_to_normal() {
        let mut soup = flat_triangle([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        soup.normals = vec![[0.0, 0.6, 0.8]; 3];
        let frames = compute_tangents(&soup);
        let tangent = Vec3::from(frames.tangents[0]);
        assert_relative_eq!(tangent.dot(&Vec3::new(0.0, 0.6, 0.8)), 0.0, epsilon = 1e-6);
        assert_relative_eq!(tangent.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mirrored_uvs_keep_right_handed_frame() {
        // U runs against +X, so the raw tangent points along -X.
        let frames = compute_tangents(&flat_triangle([[1.0, 0.0], [0.0, 0.0], [1.0, 1.0]]));
        let tangent = Vec3::from(frames.tangents[0]);
        let bitangent = Vec3::from(frames.bitangents[0]);
        let normal = Vec3::z();
        assert!(normal.cross(&tangent).dot(&bitangent) >= 0.0);
    }

    #[test]
    fn test_degenerate_uvs_stay_finite() {
        let frames = compute_tangents(&flat_triangle([[0.5, 0.5]; 3]));
        assert!(frames.tangents.iter().flatten().all(|v| v.is_finite()));
    }
}
