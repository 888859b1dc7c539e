//! A module for abstracting the interactive evolution of a population of textures.
//!
//! # Interactive Evolution
//!
//! Rather than measuring fitness automatically, the person looking at the population acts as
//! the selection operator:
//!
//! 1. Initialise a *Population* of random *Texture*s.
//! 2. Sample each texture over the canvas so that it may be displayed.
//! 3. The viewer selects the textures they like.
//! 4. Breed a new generation from the selection via crossover and point mutation.
//! 5. GOTO 2.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::texture::Texture;
use log::{debug, warn};
use rand::Rng;
use scoped_threadpool::Pool as ThreadPool;
use std::mem;
use std::sync::mpsc;

/// Breed `count` new textures from the `selected` pool.
///
/// Each child is the crossover of two parents drawn uniformly (with replacement) from the pool,
/// after which each of its channels receives up to `max_mutations` point mutations.
pub fn evolve<R>(
    rng: &mut R,
    selected: &[Texture],
    count: usize,
    max_mutations: usize,
) -> Result<Vec<Texture>>
where
    R: Rng,
{
    let parents = selected.iter().collect::<Vec<_>>();
    let mut children = Vec::with_capacity(count);
    breed(rng, &parents, count, max_mutations, &mut children)?;
    Ok(children)
}

// Append `count` children of `parents` to `children`. Nothing is appended on error.
fn breed<R>(
    rng: &mut R,
    parents: &[&Texture],
    count: usize,
    max_mutations: usize,
    children: &mut Vec<Texture>,
) -> Result<()>
where
    R: Rng,
{
    if parents.is_empty() {
        warn!("asked to breed {} textures from an empty selection", count);
        return Err(Error::EmptySelection);
    }
    children.extend((0..count).map(|_| {
        let a = parents[rng.gen_range(0..parents.len())];
        let b = parents[rng.gen_range(0..parents.len())];
        let mut child = Texture::crossover(rng, a, b);
        child.mutate(rng, max_mutations);
        child
    }));
    debug!("bred {} textures from {} parents", count, parents.len());
    Ok(())
}

/// The simulation in which the population is evolved.
pub struct Simulation {
    thread_pool: ThreadPool,
    config: Config,
    population: Vec<Texture>,
    // For collecting the next generation as it is bred.
    new_population_buffer: Vec<Texture>,
}

impl Simulation {
    /// Initialise the simulation with a random population.
    pub fn new<R>(rng: &mut R, config: Config) -> Result<Self>
    where
        R: Rng,
    {
        config.validate()?;
        let num_threads = config.num_threads.unwrap_or(num_cpus::get() as _);
        let thread_pool = ThreadPool::new(num_threads);
        let population = random_population(rng, &config)?;
        let new_population_buffer = Vec::with_capacity(population.len());
        debug!(
            "initialised {} textures using {} threads",
            population.len(),
            num_threads
        );
        Ok(Simulation {
            thread_pool,
            config,
            population,
            new_population_buffer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// View the current generation's population.
    pub fn population(&self) -> &[Texture] {
        &self.population
    }

    /// Replace the whole population with freshly grown textures.
    pub fn randomize<R>(&mut self, rng: &mut R) -> Result<()>
    where
        R: Rng,
    {
        self.population = random_population(rng, &self.config)?;
        Ok(())
    }

    /// Step forward the simulation by a single generation, breeding from the textures at the
    /// `selected` indices.
    ///
    /// Indices outside of the population are ignored. The population is left untouched if no
    /// valid index remains.
    pub fn step<R>(&mut self, rng: &mut R, selected: &[usize]) -> Result<()>
    where
        R: Rng,
    {
        let Simulation {
            ref config,
            ref mut population,
            ref mut new_population_buffer,
            ..
        } = *self;

        let parents = selected
            .iter()
            .filter_map(|&ix| {
                let parent = population.get(ix);
                if parent.is_none() {
                    warn!("ignoring selection {} outside of population", ix);
                }
                parent
            })
            .collect::<Vec<_>>();
        breed(
            rng,
            &parents,
            config.population,
            config.max_mutations,
            new_population_buffer,
        )?;

        mem::swap(population, new_population_buffer);
        new_population_buffer.clear();
        Ok(())
    }

    /// Sample every texture over the canvas using the thread pool.
    ///
    /// The returned buffers are in population order, each holding the canvas in row-major
    /// order.
    pub fn sample(&mut self) -> Vec<Vec<[f32; 3]>> {
        let Simulation {
            ref mut thread_pool,
            ref config,
            ref population,
            ..
        } = *self;
        let canvas = config.canvas;

        let (tx, rx) = mpsc::channel();
        thread_pool.scoped(|scoped| {
            for (index, texture) in population.iter().enumerate() {
                let tx = tx.clone();
                scoped.execute(move || {
                    let pixels = texture.sample(&canvas);
                    tx.send((index, pixels))
                        .expect("receiver outlives the pool scope");
                });
            }
        });
        mem::drop(tx);

        // Results arrive in completion order.
        let mut samples = rx.iter().collect::<Vec<_>>();
        samples.sort_by_key(|&(index, _)| index);
        debug!(
            "sampled {} textures at {}x{}",
            samples.len(),
            canvas.width,
            canvas.height
        );
        samples.into_iter().map(|(_, pixels)| pixels).collect()
    }
}

fn random_population<R>(rng: &mut R, config: &Config) -> Result<Vec<Texture>>
where
    R: Rng,
{
    (0..config.population)
        .map(|_| {
            Texture::grow(rng, config.min_budget..=config.max_budget).ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "cannot grow textures from budgets {}..={}",
                    config.min_budget, config.max_budget
                ))
            })
        })
        .collect()
}
