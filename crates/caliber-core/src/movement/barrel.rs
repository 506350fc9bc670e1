//! Barrel - mainspring housing and the first gear of the train

use glam::Vec3;
use std::f32::consts::FRAC_PI_2;
use tracing::debug;

use super::oscillator::Spin;
use super::{Mechanism, Tick};
use crate::catalog::{CatalogError, PartCatalog};
use crate::gear::{Bore, GearProfile, ToothShape};
use crate::geometry::{spiral, GeometryError};
use crate::material;
use crate::part::{Part, Renderable};
use crate::scene::{Geometry, Node, NodeId, Scene};

/// Unwinding rate of the mainspring in rad/s
pub const MAINSPRING_RATE: f64 = 0.05;

/// Gear ring r 0.286 meshes with the centre pinion r 0.03 at the origin
const POSITION: Vec3 = Vec3::new(-0.32, 0.0, -0.12);

#[derive(Debug)]
pub struct Barrel {
    root: NodeId,
    case: NodeId,
    mainspring: NodeId,
    gear: NodeId,
    spin: Spin,
}

impl Barrel {
    pub fn build(scene: &mut Scene, parent: NodeId) -> Result<Self, GeometryError> {
        let root = scene.add(Some(parent), Node::group("barrel_assembly").at(POSITION));

        let case = scene.add_mesh(
            root,
            Geometry::Cylinder {
                radius_top: 0.234,
                radius_bottom: 0.234,
                height: 0.078,
                segments: 32,
            },
            material::metal(0xa0a0a0),
            |n| n.named("barrel").rotated(Vec3::X * FRAC_PI_2).order(10),
        );

        let mainspring = scene.add_mesh(
            root,
            Geometry::Tube {
                path: spiral(20.0, 0.05, 0.21, 500),
                radius: 0.003,
                radial_segments: 6,
            },
            material::spring(),
            |n| n.named("mainspring").order(11),
        );

        let ring = GearProfile::new(56, 0.286, Bore::Ratio(0.82), 0.10, ToothShape::Wheel)?;
        let gear = scene.add_mesh(
            root,
            Geometry::Mesh(ring.extrude(0.02, None)?),
            material::metal(0xb0b0b0),
            |n| n.named("barrel_gear").order(12),
        );

        debug!(teeth = ring.teeth, "Built barrel");
        Ok(Self {
            root,
            case,
            mainspring,
            gear,
            spin: Spin::new(MAINSPRING_RATE),
        })
    }

    pub fn gear(&self) -> NodeId {
        self.gear
    }

    pub fn mainspring_angle(&self) -> f64 {
        self.spin.angle()
    }
}

impl Mechanism for Barrel {
    fn name(&self) -> &'static str {
        "barrel"
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn update(&mut self, scene: &mut Scene, tick: &Tick<'_>) {
        let angle = self.spin.advance(tick.delta_time);
        scene.set_rotation_z(self.mainspring, angle as f32);
    }

    fn parts(&self, _scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError> {
        Ok(vec![
            Part::from_catalog(catalog, "barrel", Renderable::single(self.case))?,
            Part::from_catalog(catalog, "mainspring", Renderable::single(self.mainspring))?,
        ])
    }
}
