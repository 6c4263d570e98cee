//! Ray picking against posed triangles
//!
//! Meshes are skinned on the CPU with [`skin_triangles`] and then tested
//! with [`raycast_polygons`], which returns the nearest hit in front of the
//! ray origin.

use glam::{Mat4, Vec3};

/// Determinant below which a ray counts as parallel to a triangle
const PARALLEL_EPSILON: f32 = 1.0e-6;

/// Half-line starting at `origin`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Direction; hit distances are in multiples of its length
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Triangle in model space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Intersect with `ray` using the Möller–Trumbore algorithm
    ///
    /// Returns the ray parameter and the barycentric `(u, v)` of the hit.
    /// Back faces are hit as well; hits at or behind the origin are not.
    pub fn intersect(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);
        if a > -PARALLEL_EPSILON && a < PARALLEL_EPSILON {
            return None; // Ray is parallel to triangle
        }

        let f = 1.0 / a;
        let s = ray.origin - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if t > PARALLEL_EPSILON { Some((t, u, v)) } else { None }
    }
}

/// Nearest intersection found by [`raycast_polygons`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Index of the triangle that was hit
    pub triangle: usize,
    /// Ray parameter of the hit
    pub distance: f32,
    pub point: Vec3,
    /// Barycentric weights of the second and third vertex
    pub barycentric: (f32, f32),
}

/// Find the closest triangle hit by `ray`
pub fn raycast_polygons(ray: &Ray, triangles: &[Triangle]) -> Option<RayHit> {
    triangles
        .iter()
        .enumerate()
        .filter_map(|(index, triangle)| {
            triangle.intersect(ray).map(|(distance, u, v)| RayHit {
                triangle: index,
                distance,
                point: ray.at(distance),
                barycentric: (u, v),
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Pose triangles through a skinning palette, one bone per vertex
///
/// `bones[i]` holds the palette index of each vertex of `triangles[i]`.
/// Vertices without a bone entry, or whose index is outside the palette,
/// are left in place.
pub fn skin_triangles(
    triangles: &[Triangle],
    bones: &[[usize; 3]],
    palette: &[Mat4],
) -> Vec<Triangle> {
    triangles
        .iter()
        .enumerate()
        .map(|(index, triangle)| {
            let Some(indices) = bones.get(index) else {
                return *triangle;
            };
            let mut skinned = *triangle;
            for (vertex, &bone) in skinned.vertices.iter_mut().zip(indices) {
                if let Some(matrix) = palette.get(bone) {
                    *vertex = matrix.transform_point3(*vertex);
                }
            }
            skinned
        })
        .collect()
}
