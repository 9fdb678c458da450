// Copyright @yucwang 2023

use super::constants::{ INV_PI, PI, Float, Vector2f, Vector3f };

pub fn sample_uniform_disk_concentric(u: &Vector2f) -> Vector2f {
    let r1: Float = 2.0 * u.x - 1.0;
    let r2: Float = 2.0 * u.y - 1.0;

    let phi: Float;
    let r:   Float;

    if r1 == 0. && r2 == 0. {
        r = 0.0;
        phi = 0.0;
    } else if r1 * r1 > r2 * r2 {
        r = r1;
        phi = (PI / 4.0) * (r2 / r1);
    } else {
        r = r2;
        phi = (PI / 2.0) - (r1 / r2) * (PI / 4.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();

    return Vector2f::new(r * cos_phi, r * sin_phi)
}

pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let p = sample_uniform_disk_concentric(&u);
    let z = (1. - p.x * p.x - p.y * p.y).max(0.0).sqrt();

    return Vector3f::new(p.x, p.y, z)
}

pub fn sample_cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    return cos_theta * INV_PI;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concentric_disk_center() {
        let p = sample_uniform_disk_concentric(&Vector2f::new(0.5, 0.5));
        assert_eq!(p, Vector2f::new(0.0, 0.0));
    }

    #[test]
    fn test_cosine_hemisphere_is_unit_upper() {
        for i in 0..8 {
            for j in 0..8 {
                let u = Vector2f::new(i as Float / 8.0 + 0.01, j as Float / 8.0 + 0.01);
                let w = sample_cosine_hemisphere(&u);
                assert!(w.z >= 0.0);
                assert!((w.norm() - 1.0).abs() < 1e-4);
                assert!(sample_cosine_hemisphere_pdf(w.z) >= 0.0);
            }
        }
    }
}
