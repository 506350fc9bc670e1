//! Case - dial, case ring, crystal and display back
//!
//! Static; only exposes parts.

use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use tracing::debug;

use super::Mechanism;
use crate::catalog::{CatalogError, PartCatalog};
use crate::geometry::GeometryError;
use crate::material::{self, Material};
use crate::part::{Part, Renderable};
use crate::scene::{Geometry, Node, NodeId, Scene};

const DIAL_RADIUS: f32 = 0.7;
const INDEX_RADIUS: f32 = 0.6;
const DOT_RADIUS: f32 = 0.62;

#[derive(Debug)]
pub struct Case {
    root: NodeId,
    dial: NodeId,
    ring: NodeId,
    crystal: NodeId,
}

/// Position on the dial for a fraction of a turn, starting at six o'clock
fn dial_point(fraction: f32, radius: f32) -> (Vec2, f32) {
    let angle = fraction * TAU - FRAC_PI_2;
    (Vec2::from_angle(angle) * radius, angle)
}

impl Case {
    pub fn build(scene: &mut Scene, parent: NodeId) -> Result<Self, GeometryError> {
        let root = scene.add(Some(parent), Node::group("case_assembly"));
        let dial = build_dial(scene, root);

        let ring = scene.add_mesh(
            root,
            Geometry::Torus {
                radius: 0.75,
                tube: 0.08,
                radial_segments: 16,
                tubular_segments: 64,
            },
            material::case(),
            |n| n.named("case"),
        );

        let crystal_glass = Material {
            transmission: 0.98,
            opacity: 0.15,
            roughness: 0.02,
            ..material::glass()
        };
        let crystal = scene.add_mesh(
            root,
            Geometry::Dome {
                radius: 0.72,
                width_segments: 64,
                height_segments: 32,
                flatten: 0.15,
            },
            crystal_glass,
            |n| n.named("crystal").at(Vec3::new(0.0, 0.0, 0.1)).order(200),
        );

        let back_glass = Material {
            transmission: 0.9,
            opacity: 0.2,
            ..material::glass()
        };
        scene.add_mesh(
            root,
            Geometry::Disc {
                radius: 0.72,
                segments: 64,
            },
            back_glass,
            |n| {
                n.named("back_case")
                    .at(Vec3::new(0.0, 0.0, -0.2))
                    .rotated(Vec3::Y * PI)
            },
        );

        debug!("Built case");
        Ok(Self {
            root,
            dial,
            ring,
            crystal,
        })
    }
}

fn build_dial(scene: &mut Scene, root: NodeId) -> NodeId {
    let dial = scene.add(Some(root), Node::group("dial"));
    scene.add_mesh(
        dial,
        Geometry::Disc {
            radius: DIAL_RADIUS,
            segments: 64,
        },
        material::dial(),
        |n| n.named("dial_base").at(Vec3::new(0.0, 0.0, 0.05)).order(1),
    );

    let markers = scene.add_material(material::metal(0xe0e0e0));
    let major = scene.add_geometry(Geometry::Cuboid {
        size: Vec3::new(0.025, 0.08, 0.01),
    });
    let minor = scene.add_geometry(Geometry::Cuboid {
        size: Vec3::new(0.015, 0.05, 0.01),
    });
    for hour in 0..12 {
        let (at, angle) = dial_point(hour as f32 / 12.0, INDEX_RADIUS);
        let shape = if hour % 3 == 0 { major } else { minor };
        scene.add(
            Some(dial),
            Node::mesh(shape, markers)
                .at(at.extend(0.06))
                .rotated(Vec3::Z * (angle + FRAC_PI_2))
                .order(2),
        );
    }

    let dot = scene.add_geometry(Geometry::Disc {
        radius: 0.006,
        segments: 8,
    });
    for minute in (0..60).filter(|m| m % 5 != 0) {
        let (at, _) = dial_point(minute as f32 / 60.0, DOT_RADIUS);
        scene.add(Some(dial), Node::mesh(dot, markers).at(at.extend(0.06)).order(2));
    }

    scene.add_mesh(
        dial,
        Geometry::Annulus {
            inner_radius: 0.15,
            outer_radius: 0.18,
            segments: 32,
        },
        material::metal(0xc0c0c0),
        |n| n.at(Vec3::new(0.0, 0.0, 0.055)).order(2),
    );
    dial
}

impl Mechanism for Case {
    fn name(&self) -> &'static str {
        "case"
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn parts(&self, scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError> {
        Ok(vec![
            Part::from_catalog(catalog, "dial", Renderable::composite(scene, self.dial))?,
            Part::from_catalog(catalog, "case", Renderable::single(self.ring))?,
            Part::from_catalog(catalog, "crystal", Renderable::single(self.crystal))?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_layout() {
        let mut scene = Scene::new();
        let parent = scene.add(None, Node::group("movement"));
        let case = Case::build(&mut scene, parent).unwrap();
        let parts = case.parts(&scene, &PartCatalog::builtin().unwrap()).unwrap();
        // Base, 12 indices, 48 dots, inner ring
        assert_eq!(parts[0].renderable.meshes().len(), 1 + 12 + 48 + 1);

        // The first index sits straight down
        let dial = scene.node(case.dial).unwrap();
        let first = scene.node(dial.children[1]).unwrap();
        assert!(first.transform.translation.x.abs() < 1e-6);
        assert!((first.transform.translation.y + INDEX_RADIUS).abs() < 1e-6);
    }

    #[test]
    fn test_glass_overrides() {
        let mut scene = Scene::new();
        let parent = scene.add(None, Node::group("movement"));
        Case::build(&mut scene, parent).unwrap();
        let crystal = scene.node_material(scene.find("crystal").unwrap()).unwrap();
        assert_eq!(crystal.transmission, 0.98);
        assert_eq!(crystal.opacity, 0.15);
        let back = scene.node_material(scene.find("back_case").unwrap()).unwrap();
        assert_eq!(back.opacity, 0.2);
        assert!(back.transparent);
    }
}
