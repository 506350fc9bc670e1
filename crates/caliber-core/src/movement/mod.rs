//! Movement components
//!
//! Each component builds its own subtree in the scene and from then on only
//! touches nodes and materials it created. Components never read each
//! other's state; they agree because every one of them derives its motion
//! from the same [`Tick`].

pub mod balance;
pub mod barrel;
pub mod case;
pub mod escapement;
pub mod gear_train;
pub mod generator;
pub mod hands;
pub mod oscillator;
pub mod quartz;

pub use balance::Balance;
pub use barrel::Barrel;
pub use case::Case;
pub use escapement::Escapement;
pub use gear_train::{Direction, GearSpec, GearTrain};
pub use generator::Generator;
pub use hands::Hands;
pub use oscillator::{Phase, Spin};
pub use quartz::Quartz;

use crate::catalog::{CatalogError, PartCatalog};
use crate::part::Part;
use crate::scene::{NodeId, Scene};
use crate::time::TimeState;

/// The inputs shared by every component for one frame
#[derive(Debug, Clone, Copy)]
pub struct Tick<'a> {
    /// Clamped frame delta in seconds
    pub delta_time: f32,
    pub time: &'a TimeState,
}

/// A component of the movement that owns a subtree of the scene
pub trait Mechanism {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Root group of the component's subtree
    fn root(&self) -> NodeId;

    /// Advance one frame. Static components keep the default.
    fn update(&mut self, _scene: &mut Scene, _tick: &Tick<'_>) {}

    /// Pickable parts backed by this component's nodes
    fn parts(&self, scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError>;
}
