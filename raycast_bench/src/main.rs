//! Headless ray-query benchmark
//!
//! Generates a random scene, compares all five ray strategies over the same
//! ray batch, and exercises a save/load round trip of the binary scene
//! format.
//!
//! Usage: `raycast_bench [config.toml|config.ron] [scene-output.ghcs]`

use rand::rngs::StdRng;
use rand::SeedableRng;

use scene_engine::prelude::*;
use scene_engine::raycast;
use scene_engine::scene::generator;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match SceneEngineConfig::load_from_file(&path) {
            Ok(config) => {
                log::info!("loaded configuration from {path}");
                config
            }
            Err(error) => {
                log::error!("failed to load configuration from {path}: {error}");
                std::process::exit(1);
            }
        },
        None => SceneEngineConfig::default(),
    };
    if let Err(message) = config.validate() {
        log::error!("invalid configuration: {message}");
        std::process::exit(1);
    }
    let scene_path = args
        .next()
        .unwrap_or_else(|| "scenes/benchmark.ghcs".to_string());

    let world = Aabb2::new(
        Vec2::new(0.0, 0.0),
        Vec2::new(config.world.width, config.world.height),
    );

    log::info!(
        "generating {} shapes (radius {}..{}) with seed {}",
        config.bench.shape_count,
        config.bench.min_radius,
        config.bench.max_radius,
        config.bench.seed
    );
    let mut rng = StdRng::seed_from_u64(config.bench.seed);
    let mut scene = generator::random_scene(
        &mut rng,
        world,
        config.bench.shape_count,
        config.bench.min_radius,
        config.bench.max_radius,
    );
    scene.set_quadtree_depth(config.spatial.quadtree_depth);
    scene.rebuild_accelerators();

    let rays = generator::random_rays(&mut rng, world, config.bench.ray_count);
    log::info!("casting {} rays per strategy", rays.len());

    let results = raycast::run_comparison(&scene, &rays);
    let baseline = results[0].1;
    println!(
        "{:<12} {:>8} {:>12} {:>10}",
        "strategy", "hits", "avg dist", "time (ms)"
    );
    for (strategy, stats) in &results {
        println!(
            "{:<12} {:>8} {:>12.4} {:>10.3}",
            strategy.name(),
            stats.hit_count,
            stats.average_distance,
            stats.elapsed_ms
        );
    }

    let agreed = results
        .iter()
        .all(|(_, stats)| stats.hit_count == baseline.hit_count);
    if agreed {
        log::info!("all strategies agree: {} hits", baseline.hit_count);
    } else {
        log::error!("strategy hit counts diverged; see table above");
        std::process::exit(2);
    }

    // Round trip the scene through the binary format
    if let Err(error) = scene.save(&scene_path) {
        log::error!("failed to save scene to {scene_path}: {error}");
        std::process::exit(1);
    }
    match Scene::load(&scene_path) {
        Ok(loaded) => {
            let reloaded_stats = raycast::run_batch(&loaded, &rays, RayQueryStrategy::BvhTree);
            if reloaded_stats.hit_count == baseline.hit_count {
                log::info!(
                    "round trip through {scene_path} verified ({} shapes, {} hits)",
                    loaded.shape_count(),
                    reloaded_stats.hit_count
                );
            } else {
                log::error!(
                    "reloaded scene reports {} hits, expected {}",
                    reloaded_stats.hit_count,
                    baseline.hit_count
                );
                std::process::exit(2);
            }
        }
        Err(error) => {
            log::error!("failed to reload scene from {scene_path}: {error}");
            std::process::exit(1);
        }
    }
}
