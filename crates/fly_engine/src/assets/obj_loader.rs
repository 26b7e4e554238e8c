//! OBJ file loader for 3D models
//!
//! Only geometry is read: `v`, `vt`, `vn` and `f`. Polygons are fan
//! triangulated, texture coordinates get their V axis flipped to match GL's
//! bottom-up texture origin, and corners without a normal get the face normal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::assets::{AssetError, AssetResult};
use crate::foundation::math::Vec3;

/// Unindexed triangles, three corners per triangle in each array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleSoup {
    /// Corner positions
    pub positions: Vec<[f32; 3]>,
    /// Corner texture coordinates
    pub uvs: Vec<[f32; 2]>,
    /// Corner normals
    pub normals: Vec<[f32; 3]>,
}

impl TriangleSoup {
    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn push_corner(&mut self, position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) {
        self.positions.push(position);
        self.uvs.push(uv);
        self.normals.push(normal);
    }
}

#[derive(Clone, Copy)]
struct Corner {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

/// Wavefront OBJ reader
pub struct ObjLoader;

impl ObjLoader {
    /// Read an OBJ file from disk
    pub fn load(path: impl AsRef<Path>) -> AssetResult<TriangleSoup> {
        let path = path.as_ref();
        log::debug!("Loading OBJ {}", path.display());
        let file = File::open(path).map_err(|source| AssetError::Io { path: path.display().to_string(), source })?;
        Self::parse(BufReader::new(file)).map_err(|e| match e {
            AssetError::Io { source, .. } => AssetError::Io { path: path.display().to_string(), source },
            other => other,
        })
    }

    /// Parse OBJ text
    pub fn parse(reader: impl BufRead) -> AssetResult<TriangleSoup> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut uvs: Vec<[f32; 2]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut soup = TriangleSoup::default();

        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line.map_err(|source| AssetError::Io { path: String::new(), source })?;
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };

            match keyword {
                "v" => positions.push(parse_floats::<3>(parts, line_number, "vertex")?),
                "vn" => normals.push(parse_floats::<3>(parts, line_number, "normal")?),
                "vt" => {
                    let [u, v] = parse_floats::<2>(parts, line_number, "texture coordinate")?;
                    uvs.push([u, 1.0 - v]);
                }
                "f" => {
                    let corners = parts
                        .map(|token| parse_corner(token, line_number))
                        .collect::<AssetResult<Vec<Corner>>>()?;
                    if corners.len() < 3 {
                        return Err(AssetError::ParseError {
                            line: line_number,
                            message: format!("face with {} corners", corners.len()),
                        });
                    }
                    for i in 1..corners.len() - 1 {
                        let triangle = [corners[0], corners[i], corners[i + 1]];
                        emit_triangle(&mut soup, &triangle, &positions, &uvs, &normals, line_number)?;
                    }
                }
                _ => {}
            }
        }

        if soup.positions.is_empty() {
            return Err(AssetError::InvalidFormat("no faces found in OBJ data".to_string()));
        }
        Ok(soup)
    }
}

fn parse_floats<'a, const N: usize>(
    mut parts: impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> AssetResult<[f32; N]> {
    let mut values = [0.0; N];
    for value in &mut values {
        let token = parts.next().ok_or_else(|| AssetError::ParseError {
            line,
            message: format!("{what} needs {N} components"),
        })?;
        *value = token.parse().map_err(|_| AssetError::ParseError {
            line,
            message: format!("invalid {what} component '{token}'"),
        })?;
    }
    Ok(values)
}

fn parse_corner(token: &str, line: usize) -> AssetResult<Corner> {
    let mut fields = token.split('/');
    let index = |field: Option<&str>| -> AssetResult<Option<usize>> {
        match field {
            None | Some("") => Ok(None),
            Some(text) => match text.parse::<usize>() {
                Ok(value) if value > 0 => Ok(Some(value - 1)),
                _ => Err(AssetError::ParseError { line, message: format!("invalid face index '{text}'") }),
            },
        }
    };

    let position = index(fields.next())?
        .ok_or_else(|| AssetError::ParseError { line, message: format!("face corner '{token}' has no position") })?;
    Ok(Corner { position, uv: index(fields.next())?, normal: index(fields.next())? })
}

fn emit_triangle(
    soup: &mut TriangleSoup,
    triangle: &[Corner; 3],
    positions: &[[f32; 3]],
    uvs: &[[f32; 2]],
    normals: &[[f32; 3]],
    line: usize,
) -> AssetResult<()> {
    let out_of_range = |kind: &str, index: usize| AssetError::ParseError {
        line,
        message: format!("{kind} index {} out of range", index + 1),
    };

    let mut corner_positions = [[0.0; 3]; 3];
    for (slot, corner) in corner_positions.iter_mut().zip(triangle) {
        *slot = *positions.get(corner.position).ok_or_else(|| out_of_range("position", corner.position))?;
    }
    let face_normal = face_normal(&corner_positions);

    for (corner, position) in triangle.iter().zip(corner_positions) {
        let uv = match corner.uv {
            Some(i) => *uvs.get(i).ok_or_else(|| out_of_range("texture coordinate", i))?,
            None => [0.0, 0.0],
        };
        let normal = match corner.normal {
            Some(i) => *normals.get(i).ok_or_else(|| out_of_range("normal", i))?,
            None => face_normal,
        };
        soup.push_corner(position, uv, normal);
    }
    Ok(())
}

fn face_normal(corners: &[[f32; 3]; 3]) -> [f32; 3] {
    let [a, b, c] = corners.map(Vec3::from);
    let normal = (b - a).cross(&(c - a));
    normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y).into()
}
