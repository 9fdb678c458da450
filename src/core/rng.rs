// Copyright @yucwang 2026

use crate::math::constants::Float;

const PCG32_MULT: u64 = 0x5851_f42d_4c95_7f2d;
pub const PCG32_DEFAULT_STREAM: u64 = 0xda3e_39cb_94b9_5bdb;

/// PCG32 generator (O'Neill): 64-bit LCG state with a permuted 32-bit output.
#[derive(Debug, Clone)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Default for Pcg32 {
    fn default() -> Self {
        Self::new(0, PCG32_DEFAULT_STREAM)
    }
}

impl Pcg32 {
    pub fn new(seed: u64, stream: u64) -> Self {
        let mut rng = Self { state: 0, inc: (stream << 1) | 1 };
        rng.next_u32();
        rng.state = rng.state.wrapping_add(seed);
        rng.next_u32();
        rng
    }

    pub fn seed(&mut self, seed: u64, stream: u64) {
        *self = Self::new(seed, stream);
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> Float {
        // 23 mantissa bits mapped into [1, 2)
        let bits = (self.next_u32() >> 9) | 0x3f80_0000;
        f32::from_bits(bits) - 1.0
    }
}

/// Mix a seed so that neighbouring seeds start far apart in the sequence.
pub fn scramble_seed(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcg32_is_reproducible() {
        let mut a = Pcg32::new(42, PCG32_DEFAULT_STREAM);
        let mut b = Pcg32::new(42, PCG32_DEFAULT_STREAM);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        let mut c = Pcg32::new(43, PCG32_DEFAULT_STREAM);
        let mut a = Pcg32::new(42, PCG32_DEFAULT_STREAM);
        let same = (0..16).filter(|_| a.next_u32() == c.next_u32()).count();
        assert!(same < 16);
    }

    #[test]
    fn test_pcg32_float_range() {
        let mut rng = Pcg32::default();
        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!(v >= 0.0 && v < 1.0);
        }
    }

    #[test]
    fn test_scramble_seed_spreads_neighbours() {
        assert_ne!(scramble_seed(0), scramble_seed(1));
        assert_eq!(scramble_seed(7), scramble_seed(7));
    }
}
