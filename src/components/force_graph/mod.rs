mod component;
mod measure;
mod render;
mod state;

pub use component::ForceGraphCanvas;
