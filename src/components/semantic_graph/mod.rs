//! Canvas engine for semantic graphs: animated layouts, a fit-aware camera
//! and batched rendering of large node sets.

mod animator;
mod camera;
mod colors;
mod component;
mod config;
mod error;
mod interaction;
mod layout;
mod links;
mod listeners;
pub mod ops;
mod render;
mod spatial;
mod state;
mod types;

pub use colors::category_color;
pub use component::SemanticGraphCanvas;
pub use config::{EngineConfig, LodBuckets, LodMatch, LodRule};
pub use types::{GraphNode, HoverInfo, LayoutMode};
