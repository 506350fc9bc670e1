//! Hands - hour, minute and sweeping second hand
//!
//! Driven by the absolute time of day, so the dial shows the true time
//! after any pause.

use glam::{Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;
use tracing::debug;

use super::{Mechanism, Tick};
use crate::catalog::{CatalogError, PartCatalog};
use crate::geometry::{Bevel, GeometryError, Outline};
use crate::material;
use crate::part::{Part, Renderable};
use crate::scene::{Geometry, Node, NodeId, Scene};
use crate::time::TimeState;

const HAND_BEVEL: Bevel = Bevel {
    size: 0.001,
    thickness: 0.001,
    segments: 2,
};

const HOUR_OUTLINE: [Vec2; 6] = [
    Vec2::new(0.0, -0.03),
    Vec2::new(-0.015, 0.0),
    Vec2::new(-0.01, 0.35),
    Vec2::new(0.0, 0.38),
    Vec2::new(0.01, 0.35),
    Vec2::new(0.015, 0.0),
];

const MINUTE_OUTLINE: [Vec2; 6] = [
    Vec2::new(0.0, -0.04),
    Vec2::new(-0.012, 0.0),
    Vec2::new(-0.006, 0.5),
    Vec2::new(0.0, 0.55),
    Vec2::new(0.006, 0.5),
    Vec2::new(0.012, 0.0),
];

#[derive(Debug)]
pub struct Hands {
    root: NodeId,
    hour: NodeId,
    minute: NodeId,
    second: NodeId,
}

/// Extrude a hand outline, centre it, then shift it so it overhangs the pivot
fn hand_mesh(outline: [Vec2; 6], depth: f32, shift: f32) -> Result<Geometry, GeometryError> {
    let mut mesh = Outline::new(outline)?.extrude(depth, Some(HAND_BEVEL))?;
    mesh.center();
    mesh.translate(Vec3::new(0.0, shift, 0.0));
    Ok(Geometry::Mesh(mesh))
}

impl Hands {
    pub fn build(scene: &mut Scene, parent: NodeId) -> Result<Self, GeometryError> {
        let root = scene.add(Some(parent), Node::group("hands").at(Vec3::new(0.0, 0.0, 0.08)));

        let hour = scene.add_mesh(
            root,
            hand_mesh(HOUR_OUTLINE, 0.012, 0.15)?,
            material::hand(0xe0e0e0),
            |n| n.named("hour_hand").at(Vec3::new(0.0, 0.0, 0.01)).order(100),
        );
        let minute = scene.add_mesh(
            root,
            hand_mesh(MINUTE_OUTLINE, 0.008, 0.22)?,
            material::hand(0xe0e0e0),
            |n| n.named("minute_hand").at(Vec3::new(0.0, 0.0, 0.02)).order(101),
        );

        let second = scene.add(
            Some(root),
            Node::group("second_hand").at(Vec3::new(0.0, 0.0, 0.03)),
        );
        scene.add_mesh(
            second,
            Geometry::Cuboid {
                size: Vec3::new(0.003, 0.65, 0.004),
            },
            material::hand(0xc0c0c0),
            |n| n.at(Vec3::new(0.0, 0.22, 0.0)).order(102),
        );
        scene.add_mesh(
            second,
            Geometry::Cone {
                radius: 0.008,
                height: 0.04,
                segments: 8,
            },
            material::hand(0xff4444),
            |n| n.at(Vec3::new(0.0, 0.55, 0.0)).order(102),
        );
        scene.add_mesh(
            second,
            Geometry::Disc {
                radius: 0.015,
                segments: 16,
            },
            material::hand(0xff4444),
            |n| n.at(Vec3::new(0.0, -0.08, 0.0)).order(102),
        );

        scene.add_mesh(
            root,
            Geometry::Cylinder {
                radius_top: 0.02,
                radius_bottom: 0.02,
                height: 0.05,
                segments: 16,
            },
            material::metal(0xd0d0d0),
            |n| {
                n.named("center_pivot")
                    .at(Vec3::new(0.0, 0.0, 0.015))
                    .rotated(Vec3::X * FRAC_PI_2)
                    .order(103)
            },
        );

        debug!("Built hands");
        Ok(Self {
            root,
            hour,
            minute,
            second,
        })
    }

    /// Point the hands at a time of day
    pub fn set_time(&self, scene: &mut Scene, time: &TimeState) {
        scene.set_rotation_z(self.hour, time.hour_hand_angle() as f32);
        scene.set_rotation_z(self.minute, time.minute_hand_angle() as f32);
        scene.set_rotation_z(self.second, time.second_hand_angle() as f32);
    }
}

impl Mechanism for Hands {
    fn name(&self) -> &'static str {
        "hands"
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn update(&mut self, scene: &mut Scene, tick: &Tick<'_>) {
        self.set_time(scene, tick.time);
    }

    fn parts(&self, scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError> {
        Ok(vec![
            Part::from_catalog(catalog, "hour_hand", Renderable::single(self.hour))?,
            Part::from_catalog(catalog, "minute_hand", Renderable::single(self.minute))?,
            Part::from_catalog(
                catalog,
                "second_hand",
                Renderable::composite(scene, self.second),
            )?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hands_follow_time() {
        let mut scene = Scene::new();
        let parent = scene.add(None, Node::group("movement"));
        let mut hands = Hands::build(&mut scene, parent).unwrap();
        let time = TimeState::new(3, 15, 30.0);
        hands.update(&mut scene, &Tick { delta_time: 0.0, time: &time });

        let angle = |name: &str| {
            let id = scene.find(name).unwrap();
            scene.node(id).unwrap().transform.rotation.z
        };
        assert!((angle("hour_hand") + 1.7017).abs() < 1e-3);
        assert!((angle("minute_hand") + 1.6232).abs() < 1e-3);
        assert!((angle("second_hand") + std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_hand_overhangs_pivot() {
        let geometry = hand_mesh(HOUR_OUTLINE, 0.012, 0.15).unwrap();
        let Geometry::Mesh(mesh) = geometry else {
            panic!("hand is a mesh");
        };
        let (min, max) = mesh.bounds().unwrap();
        // Centred on its bounds then shifted up by 0.15
        assert!(((min.y + max.y) / 2.0 - 0.15).abs() < 1e-5);
        assert!(min.y < 0.0 && max.y > 0.3);
    }
}
