// Copyright @yucwang 2021

//! Progressive, block-parallel Monte Carlo renderer.
//!
//! `core::sampling_integrator::SamplingIntegrator` drives any
//! `core::integrator::Integrator` over the pixels of a sensor's film.

pub extern crate nalgebra as na;

pub mod core;
pub mod filters;
pub mod integrators;
pub mod io;
pub mod math;
pub mod samplers;
pub mod sensors;
pub mod shapes;
