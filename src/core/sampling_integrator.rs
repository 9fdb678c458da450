// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::RenderError;
use crate::core::image_block::ImageBlock;
use crate::core::integrator::Integrator;
use crate::core::progress::ProgressReporter;
use crate::core::properties::Properties;
use crate::core::sampler::Sampler;
use crate::core::sensor::Sensor;
use crate::core::spiral::Spiral;
use crate::core::variant::{DefaultVariant, Variant};
use crate::math::constants::{Float, Vector2f, Vector2u};
use indicatif::HumanDuration;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

pub const DEFAULT_BLOCK_SIZE: u32 = 32;
/// Largest block edge whose pixels fit in a 32-bit Morton index.
pub const MAX_BLOCK_SIZE: u32 = 1 << 15;

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSettings {
    /// Edge length of square blocks, rounded up to a power of two.
    pub block_size: u32,
    /// Samples per pixel per pass. `None` renders everything in one pass.
    pub samples_per_pass: Option<u32>,
    /// Reported only; enforcement is up to the caller.
    pub timeout: Option<Float>,
    /// Worker count, defaults to the available hardware parallelism.
    pub thread_count: Option<usize>,
    pub show_progress: bool,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            samples_per_pass: None,
            timeout: None,
            thread_count: None,
            show_progress: true,
        }
    }
}

impl SamplingSettings {
    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        let block_size = props.size_("block_size", DEFAULT_BLOCK_SIZE as usize)?;
        let samples_per_pass = props.size_opt("samples_per_pass")?;
        let thread_count = props.size_opt("thread_count")?;
        if thread_count == Some(0) {
            return Err(RenderError::Config("thread_count must be positive".to_string()));
        }
        Ok(Self {
            block_size: block_size.min(u32::MAX as usize) as u32,
            samples_per_pass: samples_per_pass.map(|v| v.min(u32::MAX as usize) as u32),
            timeout: props.float_opt("timeout")?.filter(|t| *t > 0.0),
            thread_count,
            show_progress: props.bool_("show_progress", true)?,
        })
    }
}

/// How the requested samples per pixel are split into passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassPlan {
    pub samples_per_pass: u32,
    pub pass_count: u32,
}

pub fn plan_passes(total_spp: u32, samples_per_pass: Option<u32>) -> Result<PassPlan, RenderError> {
    if total_spp == 0 {
        return Err(RenderError::Config("sample_count must be positive".to_string()));
    }
    let samples_per_pass = match samples_per_pass {
        Some(0) => return Err(RenderError::Config("samples_per_pass must be positive".to_string())),
        Some(cap) => cap.min(total_spp),
        None => total_spp,
    };
    if total_spp % samples_per_pass != 0 {
        return Err(RenderError::SampleCount { sample_count: total_spp, samples_per_pass });
    }
    Ok(PassPlan {
        samples_per_pass,
        pass_count: (total_spp + samples_per_pass - 1) / samples_per_pass,
    })
}

/// Seed for the samples of `pixel` (absolute film coordinates) in `pass`.
/// It depends on nothing else, which keeps images identical across block
/// sizes, thread counts and dispatch orders.
pub fn sample_seed(pixel: &Vector2u, film_size: &Vector2u, pass: u32) -> u64 {
    let width = film_size.x as u64;
    let pixel_count = width * film_size.y as u64;
    pixel.x as u64 + pixel.y as u64 * width + pass as u64 * pixel_count
}

/// Seed of a single (pixel, sample) lane in the batched variants.
pub fn lane_seed(pixel_seed: u64, sample_index: u32, samples_per_pass: u32) -> u64 {
    pixel_seed * samples_per_pass as u64 + sample_index as u64
}

/// Shared write-once stop flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Parameters shared by every block of one render call.
#[derive(Debug, Clone, Copy)]
pub struct BlockJob {
    pub pass: u32,
    pub samples_per_pass: u32,
    pub diff_scale_factor: Float,
    pub film_size: Vector2u,
}

/// Progressive renderer: splits the film into blocks, renders every pixel
/// with `I` and merges the results into the sensor's film. `V` picks the
/// execution strategy at build time.
pub struct SamplingIntegrator<I: Integrator, V: Variant = DefaultVariant> {
    id: String,
    integrator: I,
    settings: SamplingSettings,
    stop: CancelHandle,
    progress: AtomicU32,
    _variant: PhantomData<V>,
}

impl<I: Integrator, V: Variant> SamplingIntegrator<I, V> {
    pub fn new(integrator: I, settings: SamplingSettings) -> Result<Self, RenderError> {
        let mut settings = settings;
        if settings.block_size == 0 {
            return Err(RenderError::Config("block_size must be positive".to_string()));
        }
        let block_size = settings.block_size.checked_next_power_of_two()
            .filter(|size| *size <= MAX_BLOCK_SIZE)
            .ok_or_else(|| RenderError::Config(format!(
                "block_size {} is too large (at most {})", settings.block_size, MAX_BLOCK_SIZE)))?;
        if block_size != settings.block_size {
            log::warn!("Setting block size from {} to next higher power of two: {}",
                       settings.block_size, block_size);
            settings.block_size = block_size;
        }
        if settings.thread_count == Some(0) {
            return Err(RenderError::Config("thread_count must be positive".to_string()));
        }

        Ok(Self {
            id: generate_node_id("sampling_integrator"),
            integrator,
            settings,
            stop: CancelHandle::default(),
            progress: AtomicU32::new(0.0f32.to_bits()),
            _variant: PhantomData,
        })
    }

    pub fn integrator(&self) -> &I {
        &self.integrator
    }

    pub fn settings(&self) -> &SamplingSettings {
        &self.settings
    }

    pub fn block_size(&self) -> u32 {
        self.settings.block_size
    }

    pub fn timeout(&self) -> Option<Float> {
        self.settings.timeout
    }

    pub fn thread_count(&self) -> usize {
        self.settings.thread_count.unwrap_or_else(|| {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        })
    }

    /// Ask a running (or future) render to stop. Blocks and samples already
    /// in flight are finished, nothing new is started.
    pub fn cancel(&self) {
        self.stop.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.stop.clone()
    }

    pub fn should_stop(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Fraction of the current (or last) render job that is done.
    pub fn progress(&self) -> Float {
        f32::from_bits(self.progress.load(Ordering::Relaxed))
    }

    pub(crate) fn report(&self, reporter: &ProgressReporter, fraction: Float) {
        self.progress.store(fraction.to_bits(), Ordering::Relaxed);
        reporter.update(fraction);
    }

    pub(crate) fn reporter(&self) -> ProgressReporter {
        if self.settings.show_progress {
            ProgressReporter::new("Rendering")
        } else {
            ProgressReporter::hidden()
        }
    }

    /// Render the sensor's crop window into its film. Returns `Ok(false)`
    /// when the job was cancelled before completion.
    pub fn render(&self, scene: &I::Scene, sensor: &dyn Sensor) -> Result<bool, RenderError> {
        let film = sensor.film();
        let crop_size = film.crop_size();
        let total_spp = sensor.sampler().sample_count();
        let plan = plan_passes(total_spp, self.settings.samples_per_pass)?;

        if self.should_stop() {
            log::info!("Render job cancelled before it started.");
            return Ok(false);
        }

        film.clear();
        self.progress.store(0.0f32.to_bits(), Ordering::Relaxed);

        let passes = if plan.pass_count > 1 { format!(" {} passes,", plan.pass_count) } else { String::new() };
        if V::TILED {
            let threads = self.thread_count();
            log::info!("Starting render job ({}x{}, {} sample{},{} {} thread{})",
                       crop_size.x, crop_size.y,
                       total_spp, if total_spp == 1 { "" } else { "s" },
                       passes, threads, if threads == 1 { "" } else { "s" });
        } else {
            log::info!("Starting render job ({}x{}, {} sample{},{} {} variant)",
                       crop_size.x, crop_size.y,
                       total_spp, if total_spp == 1 { "" } else { "s" },
                       passes, V::NAME);
        }
        if let Some(timeout) = self.settings.timeout {
            log::info!("Timeout specified: {:.2} seconds.", timeout);
        }

        let timer = Instant::now();
        V::render_passes(self, scene, sensor, plan)?;

        if self.should_stop() {
            log::info!("Rendering cancelled. ({:.1}% done)", self.progress() * 100.0);
            return Ok(false);
        }
        log::info!("Rendering finished. (took {})", HumanDuration(timer.elapsed()));
        Ok(true)
    }

    /// Dispatch every block of every pass to a pool of scoped workers. Each
    /// worker owns one sampler clone and one reusable block.
    pub(crate) fn render_tiles(&self, scene: &I::Scene, sensor: &dyn Sensor, plan: PassPlan) -> Result<(), RenderError> {
        let film = sensor.film();
        let filter = film.reconstruction_filter();
        let crop_size = film.crop_size();
        // No block needs to be larger than the crop window.
        let block_size = self.settings.block_size
            .min(crop_size.x.max(crop_size.y).max(1).next_power_of_two());
        let spiral = Spiral::new(film, block_size, plan.pass_count);
        let total_blocks = spiral.block_count() * plan.pass_count as usize;
        let thread_count = self.thread_count().min(total_blocks).max(1);
        let diff_scale_factor = 1.0 / (sensor.sampler().sample_count() as Float).sqrt();
        let film_size = film.size();

        let reporter = self.reporter();
        let blocks_done = Mutex::new(0usize);
        let next_index = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);

        let worker = || -> Result<(), RenderError> {
            let mut sampler = sensor.sampler().clone_sampler();
            let mut block = ImageBlock::new(Vector2u::new(block_size, block_size), filter.clone());

            while !self.should_stop() && !abort.load(Ordering::Relaxed) {
                if next_index.fetch_add(1, Ordering::Relaxed) >= total_blocks {
                    break;
                }
                let next = spiral.next_block();
                if next.area() == 0 {
                    return Err(RenderError::EmptyBlock);
                }
                if next.size != block.size() {
                    block = ImageBlock::new(next.size, filter.clone());
                }
                block.set_offset(next.offset);

                // Never drawn from: variants reseed per pixel or lane, which
                // keeps images independent of the block partition.
                let offset = Vector2u::new(next.offset.x as u32, next.offset.y as u32);
                sampler.seed(sample_seed(&offset, &film_size, next.pass));

                let job = BlockJob {
                    pass: next.pass,
                    samples_per_pass: plan.samples_per_pass,
                    diff_scale_factor,
                    film_size,
                };
                self.render_block(scene, sensor, sampler.as_mut(), &mut block, &job)?;

                film.put(&block);

                /* locked */ {
                    let mut done = blocks_done.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    *done += 1;
                    self.report(&reporter, *done as Float / total_blocks as Float);
                }
            }
            Ok(())
        };

        let mut failure: Option<RenderError> = None;
        let worker = &worker;
        let abort = &abort;
        thread::scope(|scope| {
            let handles: Vec<_> = (0..thread_count)
                .map(|_| scope.spawn(move || {
                    let result = worker();
                    if result.is_err() {
                        abort.store(true, Ordering::Relaxed);
                    }
                    result
                }))
                .collect();

            for handle in handles {
                let error = match handle.join() {
                    Ok(Ok(())) => continue,
                    Ok(Err(e)) => e,
                    Err(panic) => {
                        abort.store(true, Ordering::Relaxed);
                        RenderError::Worker(panic_message(panic.as_ref()))
                    }
                };
                if failure.is_none() {
                    failure = Some(error);
                }
            }
        });
        reporter.finish();

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Render every pixel sample of `block` for one pass. The sampler is
    /// reseeded per pixel (or per lane) from global coordinates.
    pub fn render_block(&self,
                        scene: &I::Scene,
                        sensor: &dyn Sensor,
                        sampler: &mut dyn Sampler,
                        block: &mut ImageBlock,
                        job: &BlockJob) -> Result<(), RenderError> {
        V::render_block(self, scene, sensor, sampler, block, job)
    }

    /// Evaluate one sample of the pixel at `pos` and splat it into `block`.
    /// Returns the estimator's validity mask.
    pub fn render_sample(&self,
                         scene: &I::Scene,
                         sensor: &dyn Sensor,
                         sampler: &mut dyn Sampler,
                         block: &mut ImageBlock,
                         pos: &Vector2f,
                         diff_scale_factor: Float,
                         active: bool) -> Result<bool, RenderError> {
        let position_sample = pos + sampler.next_2d(active);

        let mut aperture_sample = Vector2f::new(0.5, 0.5);
        if sensor.needs_aperture_sample() {
            aperture_sample = sampler.next_2d(active);
        }

        let mut time = sensor.shutter_open();
        if sensor.shutter_open_time() > 0.0 {
            time += sampler.next_1d(active) * sensor.shutter_open_time();
        }

        let wavelength_sample = sampler.next_1d(active);

        let film = sensor.film();
        let crop_offset = film.crop_offset();
        let crop_size = film.crop_size();
        let adjusted_position = Vector2f::new(
            (position_sample.x - crop_offset.x as Float) / crop_size.x as Float,
            (position_sample.y - crop_offset.y as Float) / crop_size.y as Float,
        );
        let (mut ray, ray_weight) = sensor.sample_ray_differential(
            time, wavelength_sample, &adjusted_position, &aperture_sample);

        ray.scale_differential(diff_scale_factor);

        let (result, valid) = self.integrator.sample(scene, sampler, &ray, active)?;

        let alpha: Float = 1.0;
        block.put(&position_sample, &ray.wavelengths, &(ray_weight * result), alpha, active);
        Ok(valid && active)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}

impl<I: Integrator, V: Variant> ComputationNode for SamplingIntegrator<I, V> {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        let samples_per_pass = match self.settings.samples_per_pass {
            Some(spp) => spp.to_string(),
            None => String::from("all"),
        };
        format!("SamplingIntegrator[variant = {}, block_size = {}, samples_per_pass = {}, integrator = {}]",
                V::NAME, self.settings.block_size, samples_per_pass, self.integrator.describe())
    }
}
