//! Gear Train - centre, third and fourth wheels
//!
//! Wheel angles are functions of the absolute time of day, not accumulated
//! deltas. The centre wheel turns once per hour so it can carry the minute
//! hand and the fourth wheel once per minute. Adjacent stages turn in
//! opposite directions, as meshed gears do.
//!
//! Power flows from each wheel's outer teeth into the next stage's pinion,
//! so centre distances equal wheel radius plus pinion radius.

use glam::Vec3;
use serde::Serialize;
use std::f32::consts::FRAC_PI_2;
use std::f64::consts::TAU;
use tracing::debug;

use super::{Mechanism, Tick};
use crate::catalog::{CatalogError, PartCatalog};
use crate::gear::{Bore, GearProfile, ToothShape};
use crate::geometry::{Bevel, GeometryError};
use crate::material;
use crate::part::{Part, Renderable};
use crate::scene::{Geometry, Node, NodeId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Positive angle about +z
    CounterClockwise,
    Clockwise,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::CounterClockwise => 1.0,
            Direction::Clockwise => -1.0,
        }
    }
}

/// Fixed per-wheel constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GearSpec {
    pub id: &'static str,
    pub teeth: u32,
    pub radius: f32,
    pub pinion_teeth: u32,
    pub pinion_radius: f32,
    pub thickness: f32,
    #[serde(skip)]
    pub position: Vec3,
    /// Multiple of the centre wheel's rate
    pub ratio: f64,
    pub direction: Direction,
}

pub const GEAR_SPECS: [GearSpec; 3] = [
    GearSpec {
        id: "gear_center",
        teeth: 80,
        radius: 0.18,
        pinion_teeth: 10,
        pinion_radius: 0.03,
        thickness: 0.025,
        position: Vec3::new(0.0, 0.0, -0.10),
        ratio: 1.0,
        direction: Direction::CounterClockwise,
    },
    GearSpec {
        id: "gear_third",
        teeth: 75,
        radius: 0.12,
        pinion_teeth: 10,
        pinion_radius: 0.025,
        thickness: 0.02,
        position: Vec3::new(0.18, 0.09, -0.08),
        ratio: 8.0,
        direction: Direction::Clockwise,
    },
    GearSpec {
        id: "gear_fourth",
        teeth: 80,
        radius: 0.10,
        pinion_teeth: 10,
        pinion_radius: 0.022,
        thickness: 0.02,
        position: Vec3::new(0.30, 0.01, -0.06),
        ratio: 60.0,
        direction: Direction::CounterClockwise,
    },
];

const JEWEL_OFFSET: f32 = 0.015;
const PINION_GAP: f32 = 0.008;

#[derive(Debug)]
struct Wheel {
    spec: GearSpec,
    node: NodeId,
    angle: f64,
}

#[derive(Debug)]
pub struct GearTrain {
    root: NodeId,
    wheels: Vec<Wheel>,
    jewels: NodeId,
    base_rotation: f64,
}

impl GearTrain {
    pub fn build(scene: &mut Scene, parent: NodeId) -> Result<Self, GeometryError> {
        let root = scene.add(Some(parent), Node::group("gear_train"));

        let mut wheels = Vec::with_capacity(GEAR_SPECS.len());
        for (i, spec) in GEAR_SPECS.iter().enumerate() {
            let node = build_wheel(scene, root, spec, i as i32)?;
            wheels.push(Wheel {
                spec: *spec,
                node,
                angle: 0.0,
            });
        }

        // Jewel bearings share one geometry and one material
        let jewels = scene.add(Some(root), Node::group("jewels"));
        let sphere = scene.add_geometry(Geometry::Sphere {
            radius: 0.012,
            width_segments: 16,
            height_segments: 16,
        });
        let ruby = scene.add_material(material::ruby());
        for spec in &GEAR_SPECS {
            let offset = spec.thickness / 2.0 + JEWEL_OFFSET;
            for z in [offset, -offset] {
                scene.add(
                    Some(jewels),
                    Node::mesh(sphere, ruby)
                        .named("jewel")
                        .at(spec.position + Vec3::Z * z)
                        .order(30),
                );
            }
        }

        debug!(wheels = wheels.len(), "Built gear train");
        Ok(Self {
            root,
            wheels,
            jewels,
            base_rotation: 0.0,
        })
    }

    /// Set every wheel from seconds since local midnight
    pub fn set_time(&mut self, scene: &mut Scene, total_seconds: f64) {
        self.base_rotation = (total_seconds / 3600.0) * TAU;
        for wheel in &mut self.wheels {
            wheel.angle = self.base_rotation * wheel.spec.ratio * wheel.spec.direction.sign();
            scene.set_rotation_z(wheel.node, wheel.angle as f32);
        }
    }

    /// Centre wheel angle before direction is applied
    pub fn base_rotation(&self) -> f64 {
        self.base_rotation
    }

    /// Current angle of the wheel with the given id
    pub fn wheel_angle(&self, id: &str) -> Option<f64> {
        self.wheels
            .iter()
            .find(|w| w.spec.id == id)
            .map(|w| w.angle)
    }

    pub fn wheel_node(&self, id: &str) -> Option<NodeId> {
        self.wheels.iter().find(|w| w.spec.id == id).map(|w| w.node)
    }

    pub fn specs(&self) -> impl Iterator<Item = &GearSpec> {
        self.wheels.iter().map(|w| &w.spec)
    }
}

fn build_wheel(
    scene: &mut Scene,
    root: NodeId,
    spec: &GearSpec,
    index: i32,
) -> Result<NodeId, GeometryError> {
    let profile = GearProfile::new(
        spec.teeth,
        spec.radius,
        Bore::Ratio(0.3),
        0.12,
        ToothShape::Wheel,
    )?;
    let wheel = scene.add_mesh(
        root,
        Geometry::Mesh(profile.extrude(spec.thickness, Some(Bevel::SOFT))?),
        material::metal(0xb8b8b8),
        |n| n.named(spec.id).at(spec.position).order(20 + index),
    );

    scene.add_mesh(
        wheel,
        Geometry::Cylinder {
            radius_top: 0.012,
            radius_bottom: 0.012,
            height: spec.thickness * 3.0,
            segments: 16,
        },
        material::metal(0xd0d0d0),
        |n| n.rotated(Vec3::X * FRAC_PI_2).order(25),
    );

    let pinion = GearProfile::new(
        spec.pinion_teeth,
        spec.pinion_radius,
        Bore::Ratio(0.35),
        0.25,
        ToothShape::Pinion,
    )?;
    let name = format!("{}_pinion", spec.id);
    scene.add_mesh(
        wheel,
        Geometry::Mesh(pinion.extrude(0.015, None)?),
        material::metal(0xd0d0d0),
        |n| {
            n.named(&name)
                .at(Vec3::new(0.0, 0.0, -(spec.thickness / 2.0 + PINION_GAP)))
                .order(26)
        },
    );

    Ok(wheel)
}

impl Mechanism for GearTrain {
    fn name(&self) -> &'static str {
        "gear_train"
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn update(&mut self, scene: &mut Scene, tick: &Tick<'_>) {
        self.set_time(scene, tick.time.total_seconds());
    }

    fn parts(&self, scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError> {
        let mut parts = self
            .wheels
            .iter()
            .map(|w| Part::from_catalog(catalog, w.spec.id, Renderable::composite(scene, w.node)))
            .collect::<Result<Vec<_>, _>>()?;
        parts.push(Part::from_catalog(
            catalog,
            "jewel",
            Renderable::composite(scene, self.jewels),
        )?);
        Ok(parts)
    }
}
