// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::RenderError;
use crate::core::interaction::SurfaceIntersection;
use crate::core::properties::Properties;
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

pub struct Sphere {
    id: String,
    center: Vector3f,
    radius: Float,
}

impl Sphere {
    pub fn new(center: Vector3f, radius: Float) -> Self {
        Self { id: generate_node_id("sphere"), center, radius }
    }

    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        let radius = props.float_("radius", 1.0)?;
        if !(radius > 0.0) {
            return Err(RenderError::Config(format!("sphere radius must be positive, got {}", radius)));
        }
        Ok(Self::new(props.vector_("center", Vector3f::zeros())?, radius))
    }

    pub fn center(&self) -> Vector3f {
        self.center
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    /// Nearest root of the ray/sphere quadratic inside the ray segment.
    fn hit_distance(&self, ray: &Ray3f) -> Option<Float> {
        let oc = ray.origin() - self.center;
        let dir = ray.dir();
        let a = dir.dot(&dir);
        let half_b = oc.dot(&dir);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let near = (-half_b - sqrt_d) / a;
        if ray.test_segment(near) {
            return Some(near);
        }
        let far = (-half_b + sqrt_d) / a;
        if ray.test_segment(far) {
            return Some(far);
        }
        None
    }
}

impl Shape for Sphere {
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let t = self.hit_distance(ray)?;
        let p = ray.at(t);
        let n = (p - self.center) / self.radius;
        Some(SurfaceIntersection::new(p, n, t))
    }

    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.hit_distance(ray).is_some()
    }
}

impl ComputationNode for Sphere {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("Sphere[center = ({}, {}, {}), radius = {}]",
                self.center.x, self.center.y, self.center.z, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::Sphere;
    use crate::core::shape::Shape;
    use crate::math::constants::Vector3f;
    use crate::math::ray::Ray3f;

    #[test]
    fn test_sphere_front_hit() {
        let sphere = Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = sphere.ray_intersection(&ray).unwrap();
        assert!((hit.t() - 4.0).abs() < 1e-5);
        assert!((hit.geo_normal() - Vector3f::new(0.0, 0.0, -1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_sphere_hit_from_inside_and_miss() {
        let sphere = Sphere::new(Vector3f::zeros(), 2.0);
        let inside = Ray3f::new(Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let hit = sphere.ray_intersection(&inside).unwrap();
        assert!((hit.t() - 2.0).abs() < 1e-5);

        let miss = Ray3f::new(Vector3f::new(0.0, 5.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(!sphere.ray_intersection_t(&miss));

        let short = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, Some(1.0));
        assert!(sphere.ray_intersection(&short).is_none());
    }
}
