// Copyright @yucwang 2026

//! Build-time execution strategies of the sampling engine.
//!
//! `Scalar` and `Packet` fan blocks out to worker threads; `Wide` renders a
//! whole pass as one flat batch of lanes. The batched strategies run every
//! lane through the same code and mask out lanes that fall outside the image
//! instead of branching around them.

use crate::core::error::RenderError;
use crate::core::image_block::ImageBlock;
use crate::core::integrator::Integrator;
use crate::core::sampler::Sampler;
use crate::core::sampling_integrator::{lane_seed, sample_seed, BlockJob, PassPlan, SamplingIntegrator};
use crate::core::sensor::Sensor;
use crate::math::constants::{Float, Vector2f, Vector2i, Vector2u};
use crate::math::morton::morton_decode;

/// Lanes processed together by the batched strategies.
pub const PACKET_WIDTH: usize = 8;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Scalar {}
    impl Sealed for super::Packet {}
    impl Sealed for super::Wide {}
}

pub trait Variant: sealed::Sealed + Sized + Send + Sync + 'static {
    const NAME: &'static str;
    /// Whether passes are split into blocks handed to worker threads.
    const TILED: bool = true;

    fn render_passes<I: Integrator>(engine: &SamplingIntegrator<I, Self>,
                                    scene: &I::Scene,
                                    sensor: &dyn Sensor,
                                    plan: PassPlan) -> Result<(), RenderError> {
        engine.render_tiles(scene, sensor, plan)
    }

    /// Render all samples of one block into `block`, which is cleared first.
    fn render_block<I: Integrator>(engine: &SamplingIntegrator<I, Self>,
                                   scene: &I::Scene,
                                   sensor: &dyn Sensor,
                                   sampler: &mut dyn Sampler,
                                   block: &mut ImageBlock,
                                   job: &BlockJob) -> Result<(), RenderError>;
}

/// One sample at a time, pixels in Morton order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scalar;

/// Blocks rendered as masked batches of `PACKET_WIDTH` lanes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Packet;

/// Every pixel sample of a pass in a single masked batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wide;

#[cfg(feature = "wide")]
pub type DefaultVariant = Wide;

#[cfg(all(feature = "packet", not(feature = "wide")))]
pub type DefaultVariant = Packet;

#[cfg(not(any(feature = "packet", feature = "wide")))]
pub type DefaultVariant = Scalar;

impl Variant for Scalar {
    const NAME: &'static str = "scalar";

    fn render_block<I: Integrator>(engine: &SamplingIntegrator<I, Self>,
                                   scene: &I::Scene,
                                   sensor: &dyn Sensor,
                                   sampler: &mut dyn Sampler,
                                   block: &mut ImageBlock,
                                   job: &BlockJob) -> Result<(), RenderError> {
        block.clear();
        let offset = block.offset();
        let size = block.size();
        let index_count = morton_index_count(size);

        for i in 0..index_count {
            if engine.should_stop() {
                break;
            }
            let local = morton_decode(i as u32);
            if local.x >= size.x || local.y >= size.y {
                continue;
            }
            let pixel = Vector2u::new(offset.x as u32 + local.x, offset.y as u32 + local.y);
            sampler.seed(sample_seed(&pixel, &job.film_size, job.pass));

            let pos = Vector2f::new(pixel.x as Float, pixel.y as Float);
            for _ in 0..job.samples_per_pass {
                if engine.should_stop() {
                    break;
                }
                engine.render_sample(scene, sensor, sampler, block, &pos, job.diff_scale_factor, true)?;
            }
        }
        Ok(())
    }
}

impl Variant for Packet {
    const NAME: &'static str = "packet";

    fn render_block<I: Integrator>(engine: &SamplingIntegrator<I, Self>,
                                   scene: &I::Scene,
                                   sensor: &dyn Sensor,
                                   sampler: &mut dyn Sampler,
                                   block: &mut ImageBlock,
                                   job: &BlockJob) -> Result<(), RenderError> {
        render_block_lanes(engine, scene, sensor, sampler, block, job)
    }
}

impl Variant for Wide {
    const NAME: &'static str = "wide";
    const TILED: bool = false;

    fn render_passes<I: Integrator>(engine: &SamplingIntegrator<I, Self>,
                                    scene: &I::Scene,
                                    sensor: &dyn Sensor,
                                    plan: PassPlan) -> Result<(), RenderError> {
        let film = sensor.film();
        let crop_offset = film.crop_offset();
        let crop_size = film.crop_size();
        let spp = plan.samples_per_pass as u64;
        let lane_count = crop_size.x as u64 * crop_size.y as u64 * spp;
        let padded_count = padded_lane_count(lane_count);

        let mut sampler = sensor.sampler().clone_sampler();
        let mut block = ImageBlock::new(crop_size, film.reconstruction_filter().clone());
        block.set_offset(Vector2i::new(crop_offset.x as i32, crop_offset.y as i32));

        log::debug!("Wide batch: {} lanes ({} padding) per pass", padded_count, padded_count - lane_count);

        let reporter = engine.reporter();
        for pass in 0..plan.pass_count {
            if engine.should_stop() {
                break;
            }
            block.clear();
            let job = BlockJob {
                pass,
                samples_per_pass: plan.samples_per_pass,
                diff_scale_factor: 1.0 / (plan.samples_per_pass as Float).sqrt(),
                film_size: film.size(),
            };

            for lane in 0..padded_count {
                let active = lane < lane_count;
                let index = lane / spp;
                let pixel = Vector2u::new(crop_offset.x + (index % crop_size.x as u64) as u32,
                                          crop_offset.y + (index / crop_size.x as u64) as u32);
                render_lane(engine, scene, sensor, sampler.as_mut(), &mut block,
                            &pixel, (lane % spp) as u32, &job, active)?;
            }

            film.put(&block);
            engine.report(&reporter, (pass + 1) as Float / plan.pass_count as Float);
        }
        reporter.finish();
        Ok(())
    }

    fn render_block<I: Integrator>(engine: &SamplingIntegrator<I, Self>,
                                   scene: &I::Scene,
                                   sensor: &dyn Sensor,
                                   sampler: &mut dyn Sampler,
                                   block: &mut ImageBlock,
                                   job: &BlockJob) -> Result<(), RenderError> {
        render_block_lanes(engine, scene, sensor, sampler, block, job)
    }
}

/// Morton indices needed to cover a block of `size`, padded to a
/// power-of-two square.
fn morton_index_count(size: Vector2u) -> u64 {
    let edge = size.x.max(size.y).next_power_of_two() as u64;
    edge * edge
}

fn padded_lane_count(lane_count: u64) -> u64 {
    let width = PACKET_WIDTH as u64;
    (lane_count + width - 1) / width * width
}

/// Flatten a block into `block_size² × samples_per_pass` lanes, Morton order
/// over pixels, and run them packet by packet. Lanes outside the block or in
/// the padding of the last packet are inactive.
fn render_block_lanes<I: Integrator, V: Variant>(engine: &SamplingIntegrator<I, V>,
                                                 scene: &I::Scene,
                                                 sensor: &dyn Sensor,
                                                 sampler: &mut dyn Sampler,
                                                 block: &mut ImageBlock,
                                                 job: &BlockJob) -> Result<(), RenderError> {
    block.clear();
    let offset = block.offset();
    let size = block.size();
    let spp = job.samples_per_pass as u64;
    let lane_count = morton_index_count(size) * spp;
    let padded_count = padded_lane_count(lane_count);

    let mut start = 0;
    while start < padded_count {
        if engine.should_stop() {
            break;
        }
        for lane in start..start + PACKET_WIDTH as u64 {
            let local = morton_decode((lane / spp) as u32);
            let active = lane < lane_count && local.x < size.x && local.y < size.y;
            let pixel = Vector2u::new(offset.x as u32 + local.x, offset.y as u32 + local.y);
            render_lane(engine, scene, sensor, sampler, block,
                        &pixel, (lane % spp) as u32, job, active)?;
        }
        start += PACKET_WIDTH as u64;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn render_lane<I: Integrator, V: Variant>(engine: &SamplingIntegrator<I, V>,
                                          scene: &I::Scene,
                                          sensor: &dyn Sensor,
                                          sampler: &mut dyn Sampler,
                                          block: &mut ImageBlock,
                                          pixel: &Vector2u,
                                          sample_index: u32,
                                          job: &BlockJob,
                                          active: bool) -> Result<(), RenderError> {
    let seed = sample_seed(pixel, &job.film_size, job.pass);
    sampler.seed(lane_seed(seed, sample_index, job.samples_per_pass));
    let pos = Vector2f::new(pixel.x as Float, pixel.y as Float);
    engine.render_sample(scene, sensor, sampler, block, &pos, job.diff_scale_factor, active)?;
    Ok(())
}
