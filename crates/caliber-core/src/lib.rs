//! Caliber Core - Kinematic watch movement model
//!
//! This crate provides everything needed to animate a Spring Drive style
//! movement from a single wall-clock time source:
//! - Procedural gear and polygon geometry (tooth profiles, extrusion, spirals)
//! - Time sampling with timezone conversion and frame delta clamping
//! - A scene arena of transform nodes, materials, and geometry handles
//! - The moving components (barrel, gear train, escapement, balance,
//!   generator, quartz, hands) and the static case
//! - The assembly that drives them and manages part highlighting

pub mod assembly;
pub mod catalog;
pub mod frame;
pub mod gear;
pub mod geometry;
pub mod material;
pub mod movement;
pub mod part;
pub mod scene;
pub mod settings;
pub mod time;

pub use assembly::{Emissive, MovementError, MovementSnapshot, NodePose, WatchAssembly};
pub use catalog::{CatalogError, PartCatalog, PartEntry};
pub use frame::{FpsCounter, FrameClock};
pub use gear::{Bore, GearProfile, ToothShape};
pub use geometry::{Bevel, GeometryError, Mesh, Outline};
pub use material::{Color, Material};
pub use movement::{Mechanism, Tick};
pub use part::{Part, Renderable};
pub use scene::{Geometry, GeometryId, MaterialId, Node, NodeId, Scene, Transform};
pub use settings::{DisplayChange, DisplaySettings};
pub use time::{Clock, FixedClock, SystemClock, TimeError, TimeKeeper, TimeState};
