//! Graph layout: a node force simulation, a label simulation tethered to
//! it, and a brute-force label overlap resolver for static snapshots.

mod config;
mod engine;
mod forces;
mod label;
mod resolver;
mod simulation;

pub use config::{LayoutConfig, ResolverConfig, default_tether_distance};
pub use engine::{DEFAULT_NODE_COLOR, DEFAULT_NODE_SIZE, LayoutEngine, NodeInfo};
pub use forces::{CenterForce, CollideForce, LinkForce, ManyBodyForce, ResolvedLink};
pub use label::{
	ESTIMATED_CHAR_WIDTH, ESTIMATED_HEIGHT, EstimatedMetrics, LabelMetrics, LabelNode, LabelSize, TetherForce,
};
pub use resolver::{LabelBox, ResolveReport, count_overlaps, resolve_overlaps};
pub use simulation::{Force, Particle, Point, Simulation};
