// Copyright 2020 TwoCookingMice

use praline::core::computation_node::ComputationNode;
use praline::core::integrator::MonteCarloSettings;
use praline::core::sampler::Sampler;
use praline::core::scene_loader::load_scene_with_settings;
use praline::core::sampling_integrator::{SamplingIntegrator, SamplingSettings};
use praline::core::sensor::Sensor;
use praline::integrators::path::PathIntegrator;
use praline::io::write_image;

use console::style;
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::time::Duration;

const USAGE: &str = "<scene.xml> <output.exr|output.png> [--spp N] [--max-depth N] [--rr-depth N] \
                     [--block-size N] [--samples-per-pass N] [--threads N] [--timeout SECONDS] \
                     [-D name=value]...";

#[derive(Default)]
struct Overrides {
    spp: Option<u32>,
    max_depth: Option<i64>,
    rr_depth: Option<i64>,
    block_size: Option<u32>,
    samples_per_pass: Option<u32>,
    threads: Option<usize>,
    timeout: Option<f32>,
    defines: HashMap<String, String>,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    args.get(i)
        .and_then(|v| v.parse::<T>().ok())
        .ok_or_else(|| format!("{} expects a valid value", flag))
}

fn parse_overrides(args: &[String]) -> Result<Overrides, String> {
    let mut overrides = Overrides::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--spp" => overrides.spp = Some(parse_value(args, i, flag)?),
            "--max-depth" => overrides.max_depth = Some(parse_value(args, i, flag)?),
            "--rr-depth" => overrides.rr_depth = Some(parse_value(args, i, flag)?),
            "--block-size" => overrides.block_size = Some(parse_value(args, i, flag)?),
            "--samples-per-pass" => overrides.samples_per_pass = Some(parse_value(args, i, flag)?),
            "--threads" => overrides.threads = Some(parse_value(args, i, flag)?),
            "--timeout" => overrides.timeout = Some(parse_value(args, i, flag)?),
            "-D" => {
                let define: String = parse_value(args, i, flag)?;
                let (name, value) = define.split_once('=')
                    .ok_or_else(|| format!("-D expects name=value, got {}", define))?;
                overrides.defines.insert(name.to_string(), value.to_string());
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(overrides)
}

fn run(input_path: &str, output_path: &str, overrides: Overrides) -> Result<bool, Box<dyn Error>> {
    let load_result = load_scene_with_settings(input_path, &overrides.defines)?;
    let scene = load_result.scene;
    let mut sensor = load_result.sensor;
    let props = load_result.integrator;

    if let Some(spp) = overrides.spp {
        sensor.sampler_mut().set_sample_count(spp);
    }

    let defaults = MonteCarloSettings::from_properties(&props)?;
    let max_depth = overrides.max_depth
        .unwrap_or_else(|| defaults.max_depth().map_or(-1, |d| d as i64));
    let rr_depth = overrides.rr_depth.unwrap_or(defaults.rr_depth() as i64);
    let integrator = PathIntegrator::new(MonteCarloSettings::new(rr_depth, max_depth)?);

    let mut settings = SamplingSettings::from_properties(&props)?;
    if let Some(block_size) = overrides.block_size {
        settings.block_size = block_size;
    }
    if let Some(samples_per_pass) = overrides.samples_per_pass {
        settings.samples_per_pass = Some(samples_per_pass);
    }
    if overrides.threads.is_some() {
        settings.thread_count = overrides.threads;
    }
    if let Some(timeout) = overrides.timeout {
        settings.timeout = Some(timeout).filter(|t| *t > 0.0);
    }

    let engine: SamplingIntegrator<PathIntegrator> = SamplingIntegrator::new(integrator, settings)?;
    log::info!("{}", ComputationNode::to_string(&engine));
    log::info!("{}", sensor.describe());

    // The engine only reports the timeout; stopping is up to us.
    if let Some(timeout) = engine.timeout() {
        let handle = engine.cancel_handle();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs_f32(timeout));
            log::warn!("Timeout of {:.2} seconds reached, stopping.", timeout);
            handle.cancel();
        });
    }

    let completed = engine.render(&scene, &sensor)?;
    write_image(&sensor.film().develop(), output_path)?;
    Ok(completed)
}

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} {}", args[0], USAGE);
        std::process::exit(1);
    }

    let overrides = match parse_overrides(&args[3..]) {
        Ok(overrides) => overrides,
        Err(msg) => {
            eprintln!("{} {}", style("error:").red().bold(), msg);
            eprintln!("Usage: {} {}", args[0], USAGE);
            std::process::exit(1);
        }
    };

    match run(&args[1], &args[2], overrides) {
        Ok(true) => println!("{} {}", style("Rendered").green().bold(), args[2]),
        Ok(false) => println!("{} {} (partial image)", style("Stopped early").yellow().bold(), args[2]),
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_overrides;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_overrides() {
        let overrides = parse_overrides(&args(&["--spp", "64", "--max-depth", "-1", "--threads", "2",
                                               "-D", "res=128"])).unwrap();
        assert_eq!(overrides.spp, Some(64));
        assert_eq!(overrides.max_depth, Some(-1));
        assert_eq!(overrides.threads, Some(2));
        assert_eq!(overrides.defines.get("res").map(String::as_str), Some("128"));
        assert!(overrides.block_size.is_none());
    }

    #[test]
    fn test_parse_overrides_rejects_garbage() {
        assert!(parse_overrides(&args(&["--spp"])).is_err());
        assert!(parse_overrides(&args(&["--spp", "many"])).is_err());
        assert!(parse_overrides(&args(&["--fast"])).is_err());
        assert!(parse_overrides(&args(&["-D", "novalue"])).is_err());
    }
}
