// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::RenderError;
use crate::core::properties::Properties;
use crate::core::rng::{scramble_seed, Pcg32, PCG32_DEFAULT_STREAM};
use crate::core::sampler::Sampler;
use crate::math::constants::{Float, Vector2f};

/// Uncorrelated uniform samples from a PCG32 stream.
#[derive(Clone)]
pub struct IndependentSampler {
    id: String,
    sample_count: u32,
    base_seed: u64,
    rng: Pcg32,
}

impl IndependentSampler {
    pub fn new(sample_count: u32, base_seed: u64) -> Self {
        Self {
            id: generate_node_id("independent"),
            sample_count: sample_count.max(1),
            base_seed,
            rng: Pcg32::new(scramble_seed(base_seed), PCG32_DEFAULT_STREAM),
        }
    }

    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        let sample_count = props.size_("sample_count", 4)?;
        if sample_count == 0 {
            return Err(RenderError::Config("sample_count must be positive".to_string()));
        }
        let base_seed = props.size_("seed", 0)? as u64;
        Ok(Self::new(sample_count as u32, base_seed))
    }
}

impl ComputationNode for IndependentSampler {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("IndependentSampler[sample_count = {}, seed = {}]", self.sample_count, self.base_seed)
    }
}

impl Sampler for IndependentSampler {
    fn seed(&mut self, seed: u64) {
        self.rng.seed(scramble_seed(seed.wrapping_add(self.base_seed)), PCG32_DEFAULT_STREAM);
    }

    fn next_1d(&mut self, active: bool) -> Float {
        if !active {
            return 0.0;
        }
        self.rng.next_f32()
    }

    fn next_2d(&mut self, active: bool) -> Vector2f {
        let x = self.next_1d(active);
        let y = self.next_1d(active);
        Vector2f::new(x, y)
    }

    fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn set_sample_count(&mut self, sample_count: u32) {
        self.sample_count = sample_count.max(1);
    }

    fn clone_sampler(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }

    fn describe(&self) -> String {
        ComputationNode::to_string(self)
    }
}
