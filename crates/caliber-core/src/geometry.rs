//! Procedural mesh generation: outlines, extrusion, and spiral paths
//!
//! Every solid part that is not a simple primitive (gears, hands, anchor
//! body, rotor halves) is described as a 2D cross-section and extruded
//! along z. Extrusion is deterministic: the same inputs always produce the
//! same vertex layout, which the assembly relies on for reproducible frames.

use glam::{Vec2, Vec3};
use thiserror::Error;

/// Smallest signed area accepted for an outline
const MIN_AREA: f32 = 1e-10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Gear must have at least one tooth")]
    NoTeeth,
    #[error("Bore radius {bore} must be positive and smaller than root radius {root}")]
    BoreTooLarge { bore: f32, root: f32 },
    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f32 },
    #[error("Tooth height ratio must be within (0, 1), got {0}")]
    ToothHeight(f32),
    #[error("Outline needs at least three distinct points and a non-zero area")]
    DegenerateOutline,
    #[error("Outline could not be triangulated (self-intersecting?)")]
    Triangulation,
}

/// Rounded edge applied to both caps of an extrusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bevel {
    /// Outward growth of the cross-section at the widest bevel step
    pub size: f32,
    /// Extra depth added beyond each cap
    pub thickness: f32,
    /// Number of steps along the quarter arc
    pub segments: u32,
}

impl Bevel {
    /// The small bevel used on main wheels and hands for visual softness
    pub const SOFT: Bevel = Bevel {
        size: 0.002,
        thickness: 0.002,
        segments: 2,
    };

    pub fn new(size: f32, thickness: f32, segments: u32) -> Self {
        Self {
            size,
            thickness,
            segments,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), GeometryError> {
        if !(self.size >= 0.0) {
            return Err(GeometryError::NonPositive {
                what: "bevel size",
                value: self.size,
            });
        }
        if !(self.thickness >= 0.0) {
            return Err(GeometryError::NonPositive {
                what: "bevel thickness",
                value: self.thickness,
            });
        }
        if self.segments == 0 {
            return Err(GeometryError::NonPositive {
                what: "bevel segments",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Largest distance of any vertex from the local origin
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| p.length())
            .fold(0.0, f32::max)
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }

    /// Move the bounding box centre to the origin
    pub fn center(&mut self) {
        if let Some((min, max)) = self.bounds() {
            self.translate(-(min + max) * 0.5);
        }
    }

    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
    }
}

/// One closed loop of a cross-section
pub(crate) struct Ring {
    pub points: Vec<Vec2>,
    /// Direction each point moves when the bevel grows the section
    pub normals: Vec<Vec2>,
    /// Holes face their walls toward the axis
    pub hole: bool,
}

/// Extrude rings into a closed solid.
///
/// `cap` triangles index the concatenated ring points and must wind
/// counter-clockwise seen from +z. The result is centred on z = 0.
pub(crate) fn extrude_rings(
    rings: &[Ring],
    cap: &[[u32; 3]],
    depth: f32,
    bevel: Option<Bevel>,
) -> Mesh {
    let half = depth * 0.5;
    let mut layers: Vec<(f32, f32)> = Vec::new();
    match bevel {
        Some(b) => {
            let steps = b.segments;
            let arc = |i: u32| {
                let phi = (i as f32 / steps as f32) * std::f32::consts::FRAC_PI_2;
                (half + b.thickness * phi.cos(), b.size * phi.sin())
            };
            layers.extend((0..=steps).map(arc));
            layers.extend((0..=steps).rev().map(|i| {
                let (z, offset) = arc(i);
                (-z, offset)
            }));
        }
        None => {
            layers.push((half, 0.0));
            layers.push((-half, 0.0));
        }
    }

    let section: u32 = rings.iter().map(|r| r.points.len() as u32).sum();
    let mut mesh = Mesh::default();
    mesh.positions.reserve(layers.len() * section as usize);

    for &(z, offset) in &layers {
        for ring in rings {
            for (p, n) in ring.points.iter().zip(&ring.normals) {
                let q = *p + *n * offset;
                mesh.positions.push(Vec3::new(q.x, q.y, z));
            }
        }
    }

    // Caps: first layer faces +z, last layer faces -z
    let back = (layers.len() as u32 - 1) * section;
    for tri in cap {
        mesh.indices.extend_from_slice(tri);
    }
    for tri in cap {
        mesh.indices
            .extend_from_slice(&[back + tri[0], back + tri[2], back + tri[1]]);
    }

    // Side walls between consecutive layers
    let mut ring_start = 0u32;
    for ring in rings {
        let n = ring.points.len() as u32;
        for layer in 0..layers.len() as u32 - 1 {
            let a0 = layer * section + ring_start;
            let b0 = (layer + 1) * section + ring_start;
            for j in 0..n {
                let k = (j + 1) % n;
                let (a, a1, b, b1) = (a0 + j, a0 + k, b0 + j, b0 + k);
                if ring.hole {
                    mesh.indices.extend_from_slice(&[a, a1, b1, a, b1, b]);
                } else {
                    mesh.indices.extend_from_slice(&[a, b, b1, a, b1, a1]);
                }
            }
        }
        ring_start += n;
    }

    mesh
}

/// Simple closed polygon, stored counter-clockwise
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    points: Vec<Vec2>,
}

impl Outline {
    /// Build an outline, dropping repeated points (including a repeated
    /// closing point) and normalizing the winding.
    pub fn new(points: impl IntoIterator<Item = Vec2>) -> Result<Self, GeometryError> {
        let mut cleaned: Vec<Vec2> = Vec::new();
        for p in points {
            if cleaned.last().map_or(true, |last| last.distance(p) > f32::EPSILON) {
                cleaned.push(p);
            }
        }
        while cleaned.len() > 1 && cleaned[0].distance(cleaned[cleaned.len() - 1]) <= f32::EPSILON {
            cleaned.pop();
        }
        if cleaned.len() < 3 {
            return Err(GeometryError::DegenerateOutline);
        }
        let area = signed_area(&cleaned);
        if area.abs() < MIN_AREA || !area.is_finite() {
            return Err(GeometryError::DegenerateOutline);
        }
        if area < 0.0 {
            cleaned.reverse();
        }
        Ok(Self { points: cleaned })
    }

    /// Half disc on the +x side of the y axis
    pub fn half_disc(radius: f32, segments: usize) -> Result<Self, GeometryError> {
        let segments = segments.max(2);
        Self::new((0..=segments).map(|i| {
            let angle = -std::f32::consts::FRAC_PI_2
                + std::f32::consts::PI * (i as f32 / segments as f32);
            Vec2::new(angle.cos(), angle.sin()) * radius
        }))
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn area(&self) -> f32 {
        signed_area(&self.points)
    }

    /// Extrude to a solid of the given depth, centred on z = 0
    pub fn extrude(&self, depth: f32, bevel: Option<Bevel>) -> Result<Mesh, GeometryError> {
        if !(depth > 0.0) {
            return Err(GeometryError::NonPositive {
                what: "extrusion depth",
                value: depth,
            });
        }
        if let Some(b) = &bevel {
            b.validate()?;
        }

        let cap = triangulate(&self.points)?;
        let ring = Ring {
            normals: vertex_normals(&self.points),
            points: self.points.clone(),
            hole: false,
        };
        Ok(extrude_rings(&[ring], &cap, depth, bevel))
    }
}

fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

/// Outward miter directions for a counter-clockwise polygon
fn vertex_normals(points: &[Vec2]) -> Vec<Vec2> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            let e0 = (points[i] - prev).normalize_or_zero();
            let e1 = (next - points[i]).normalize_or_zero();
            // Right-hand perpendicular points outward for CCW winding
            let outward = Vec2::new(e0.y, -e0.x) + Vec2::new(e1.y, -e1.x);
            outward.normalize_or_zero()
        })
        .collect()
}

/// Ear-clipping triangulation of a counter-clockwise simple polygon
fn triangulate(points: &[Vec2]) -> Result<Vec<[u32; 3]>, GeometryError> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let (a, b, c) = (
                remaining[(i + m - 1) % m],
                remaining[i],
                remaining[(i + 1) % m],
            );
            let (pa, pb, pc) = (points[a], points[b], points[c]);
            if (pb - pa).perp_dot(pc - pb) <= 0.0 {
                return false;
            }
            !remaining
                .iter()
                .filter(|&&k| k != a && k != b && k != c)
                .any(|&k| in_triangle(points[k], pa, pb, pc))
        });

        let Some(i) = ear else {
            return Err(GeometryError::Triangulation);
        };
        triangles.push([
            remaining[(i + m - 1) % m] as u32,
            remaining[i] as u32,
            remaining[(i + 1) % m] as u32,
        ]);
        remaining.remove(i);
    }

    triangles.push([
        remaining[0] as u32,
        remaining[1] as u32,
        remaining[2] as u32,
    ]);
    Ok(triangles)
}

fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d0 = (b - a).perp_dot(p - a);
    let d1 = (c - b).perp_dot(p - b);
    let d2 = (a - c).perp_dot(p - c);
    d0 >= 0.0 && d1 >= 0.0 && d2 >= 0.0
}

/// Flat Archimedean spiral in the xy plane, used for mainspring and hairspring paths
pub fn spiral(turns: f32, start_radius: f32, end_radius: f32, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let angle = t * std::f32::consts::TAU * turns;
            let radius = start_radius + (end_radius - start_radius) * t;
            Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
        })
        .collect()
}
