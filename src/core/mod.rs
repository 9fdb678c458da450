// Copyright @yucwang 2021

pub mod computation_node;
pub mod error;
pub mod film;
pub mod image_block;
pub mod integrator;
pub mod interaction;
pub mod progress;
pub mod properties;
pub mod rfilter;
pub mod rng;
pub mod sampler;
pub mod sampling_integrator;
pub mod scene;
pub mod scene_loader;
pub mod sensor;
pub mod shape;
pub mod spiral;
pub mod variant;
