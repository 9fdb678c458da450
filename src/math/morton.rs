// Copyright @yucwang 2026

use super::constants::Vector2u;

/// Squeeze the even bits of `v` into the low 16 bits.
fn compact_1by1(v: u32) -> u32 {
    let mut x = v & 0x5555_5555;
    x = (x ^ (x >> 1)) & 0x3333_3333;
    x = (x ^ (x >> 2)) & 0x0f0f_0f0f;
    x = (x ^ (x >> 4)) & 0x00ff_00ff;
    x = (x ^ (x >> 8)) & 0x0000_ffff;
    x
}

fn part_1by1(v: u32) -> u32 {
    let mut x = v & 0x0000_ffff;
    x = (x ^ (x << 8)) & 0x00ff_00ff;
    x = (x ^ (x << 4)) & 0x0f0f_0f0f;
    x = (x ^ (x << 2)) & 0x3333_3333;
    x = (x ^ (x << 1)) & 0x5555_5555;
    x
}

/// Z-order index to 2D position. x takes the even bits, y the odd ones.
pub fn morton_decode(index: u32) -> Vector2u {
    Vector2u::new(compact_1by1(index), compact_1by1(index >> 1))
}

pub fn morton_encode(p: Vector2u) -> u32 {
    part_1by1(p.x) | (part_1by1(p.y) << 1)
}

#[cfg(test)]
mod tests {
    use super::{morton_decode, morton_encode};
    use crate::math::constants::Vector2u;
    use std::collections::HashSet;

    #[test]
    fn test_morton_decode_first_quad() {
        assert_eq!(morton_decode(0), Vector2u::new(0, 0));
        assert_eq!(morton_decode(1), Vector2u::new(1, 0));
        assert_eq!(morton_decode(2), Vector2u::new(0, 1));
        assert_eq!(morton_decode(3), Vector2u::new(1, 1));
        assert_eq!(morton_decode(4), Vector2u::new(2, 0));
    }

    #[test]
    fn test_morton_covers_square() {
        let side = 8u32;
        let mut seen = HashSet::new();
        for i in 0..side * side {
            let p = morton_decode(i);
            assert!(p.x < side && p.y < side);
            assert_eq!(morton_encode(p), i);
            seen.insert((p.x, p.y));
        }
        assert_eq!(seen.len(), (side * side) as usize);
    }
}
