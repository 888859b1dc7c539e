//! Control parameters for growing, breeding and sampling a population of textures.

use crate::error::{Error, Result};

/// The resolution at which textures are sampled.
///
/// Pixel `(i, j)` is sampled at `x = 2i / width - 1`, `y = 2j / height - 1`, so the canvas
/// spans `[-1, 1)` along both axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// The parameters of a `Simulation`.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The number of textures within each generation.
    pub population: usize,
    /// The fewest function nodes a freshly grown channel tree may have.
    pub min_budget: usize,
    /// The most function nodes a freshly grown channel tree may have.
    pub max_budget: usize,
    /// The most point mutations applied to each channel of a bred texture.
    pub max_mutations: usize,
    pub canvas: Canvas,
    /// The number of worker threads used for sampling. `None` uses one per CPU.
    pub num_threads: Option<u32>,
}

impl Canvas {
    /// The number of pixels on the canvas.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The coordinates at which the given pixel is sampled.
    pub fn point(&self, i: u32, j: u32) -> (f32, f32) {
        let x = 2.0 * i as f32 / self.width as f32 - 1.0;
        let y = 2.0 * j as f32 / self.height as f32 - 1.0;
        (x, y)
    }
}

impl Config {
    /// Check that the parameters describe a runnable simulation.
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(Error::InvalidConfig("population must not be empty".into()));
        }
        if self.min_budget == 0 {
            return Err(Error::InvalidConfig("min_budget must be at least 1".into()));
        }
        if self.min_budget > self.max_budget {
            return Err(Error::InvalidConfig(format!(
                "min_budget {} exceeds max_budget {}",
                self.min_budget, self.max_budget
            )));
        }
        if self.canvas.is_empty() {
            return Err(Error::InvalidConfig("canvas must have at least one pixel".into()));
        }
        if self.num_threads == Some(0) {
            return Err(Error::InvalidConfig("num_threads must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas {
            width: 64,
            height: 64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            population: 9,
            min_budget: 1,
            max_budget: 20,
            max_mutations: 3,
            canvas: Canvas::default(),
            num_threads: None,
        }
    }
}
