//! Grows a population of random textures and evolves it for a few generations, writing each
//! texture out as a PPM image alongside its text form.
//!
//! A viewer would normally pick the textures to breed from. Here a random handful of each
//! generation is selected instead.
//!
//! ```text
//! RUST_LOG=texgen=debug cargo run --release --example texture -- out 5
//! ```

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use texgen::ga::Simulation;
use texgen::{Canvas, Config};

// Constants.

const DEFAULT_OUT_DIR: &str = "textures";
const DEFAULT_GENERATIONS: usize = 3;
const SELECTED_PER_GENERATION: usize = 3;

// Map a channel value in roughly `[-1, 1]` to a byte.
fn channel_byte(value: f32) -> u8 {
    let v = value * 255.0 + 127.0;
    if v.is_nan() {
        0
    } else {
        v.max(0.0).min(255.0) as u8
    }
}

fn write_ppm(path: &Path, canvas: &Canvas, pixels: &[[f32; 3]]) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write!(w, "P6\n{} {}\n255\n", canvas.width, canvas.height)?;
    for rgb in pixels {
        w.write_all(&[channel_byte(rgb[0]), channel_byte(rgb[1]), channel_byte(rgb[2])])?;
    }
    w.flush()
}

// Exe.

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
    let generations = match args.next() {
        Some(n) => n.parse()?,
        None => DEFAULT_GENERATIONS,
    };
    fs::create_dir_all(&out_dir)?;

    // A random number generator with a unique seed.
    let seed = rand::random();
    let mut rng = StdRng::seed_from_u64(seed);
    info!("RNG seed: {}", seed);

    let config = Config::default();
    let canvas = config.canvas;
    let mut sim = Simulation::new(&mut rng, config)?;

    for generation in 0..generations {
        let samples = sim.sample();
        for (i, (texture, pixels)) in sim.population().iter().zip(&samples).enumerate() {
            let stem = format!("gen{:03}_{:02}", generation, i);
            write_ppm(&out_dir.join(format!("{}.ppm", stem)), &canvas, pixels)?;
            fs::write(out_dir.join(format!("{}.txt", stem)), texture.to_string())?;
        }
        info!("wrote generation {} to {:?}", generation, out_dir);

        let population = sim.population().len();
        let selected = (0..SELECTED_PER_GENERATION)
            .map(|_| rng.gen_range(0..population))
            .collect::<Vec<_>>();
        info!("selected {:?}", selected);
        sim.step(&mut rng, &selected)?;
    }

    Ok(())
}
