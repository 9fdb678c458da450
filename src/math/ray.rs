// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};
use super::spectrum::Wavelengths;

#[derive(Debug, Clone, Copy)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f, 
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        Self { origin: o, dir: d.normalize(), 
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(std::f32::MAX)}
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    pub fn update(&mut self, t: Float) -> bool {
        if t < self.min_t || t > self.max_t {
            false
        } else {
            self.max_t = t;
            true
        }
    }

    pub fn test_segment(&self, t: Float) -> bool {
        t >= self.min_t && t <= self.max_t
    }
}

/// Primary ray carrying the origins and directions of its neighbours one
/// pixel over in x and y, used to estimate the pixel footprint.
#[derive(Debug, Clone, Copy)]
pub struct RayDifferential3f {
    pub ray: Ray3f,
    pub time: Float,
    pub wavelengths: Wavelengths,
    pub o_x: Vector3f,
    pub o_y: Vector3f,
    pub d_x: Vector3f,
    pub d_y: Vector3f,
    pub has_differentials: bool,
}

impl RayDifferential3f {
    pub fn new(ray: Ray3f, time: Float, wavelengths: Wavelengths) -> Self {
        Self {
            ray,
            time,
            wavelengths,
            o_x: ray.origin(),
            o_y: ray.origin(),
            d_x: ray.dir(),
            d_y: ray.dir(),
            has_differentials: false,
        }
    }

    pub fn with_differentials(mut self, o_x: Vector3f, o_y: Vector3f,
                              d_x: Vector3f, d_y: Vector3f) -> Self {
        self.o_x = o_x;
        self.o_y = o_y;
        self.d_x = d_x;
        self.d_y = d_y;
        self.has_differentials = true;
        self
    }

    /// Shrink the differential footprint, e.g. by 1/sqrt(spp).
    pub fn scale_differential(&mut self, amount: Float) {
        let o = self.ray.origin();
        let d = self.ray.dir();
        self.o_x = (self.o_x - o) * amount + o;
        self.o_y = (self.o_y - o) * amount + o;
        self.d_x = (self.d_x - d) * amount + d;
        self.d_y = (self.d_y - d) * amount + d;
    }
}

/* Tests for Ray */
