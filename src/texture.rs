//! A texture is an individual made of three independent expressions, one per colour channel.

use crate::config::Canvas;
use crate::gp::expr::{self, Expr};
use crate::gp::gen;
use crate::gp::grammar::parser::TEXTURE_IDENTIFIER;
use log::trace;
use rand::Rng;
use std::fmt;
use std::ops::RangeInclusive;

/// Three channel expressions evaluated over the same coordinates.
#[derive(Clone, Debug)]
pub struct Texture {
    pub r: Expr,
    pub g: Expr,
    pub b: Expr,
}

impl Texture {
    pub fn new(r: Expr, g: Expr, b: Expr) -> Self {
        Texture { r, g, b }
    }

    /// Grow three random channels, each with its own budget drawn uniformly from `budget`.
    ///
    /// Returns `None` if the range is empty or admits a budget of `0`.
    pub fn grow<R>(rng: &mut R, budget: RangeInclusive<usize>) -> Option<Self>
    where
        R: Rng,
    {
        if budget.is_empty() || *budget.start() == 0 {
            return None;
        }
        let mut channel = || {
            let n = rng.gen_range(budget.clone());
            gen::grow_tree(&mut *rng, n)
        };
        Some(Texture::new(channel()?, channel()?, channel()?))
    }

    pub fn channels(&self) -> [&Expr; 3] {
        [&self.r, &self.g, &self.b]
    }

    pub fn channels_mut(&mut self) -> [&mut Expr; 3] {
        [&mut self.r, &mut self.g, &mut self.b]
    }

    /// Evaluate each channel at the given coordinates.
    pub fn eval(&self, x: f32, y: f32) -> [f32; 3] {
        [self.r.eval(x, y), self.g.eval(x, y), self.b.eval(x, y)]
    }

    /// Evaluate every pixel of the canvas in row-major order.
    pub fn sample(&self, canvas: &Canvas) -> Vec<[f32; 3]> {
        let mut pixels = Vec::with_capacity(canvas.len());
        for j in 0..canvas.height {
            for i in 0..canvas.width {
                let (x, y) = canvas.point(i, j);
                pixels.push(self.eval(x, y));
            }
        }
        pixels
    }

    /// Cross each channel of `a` with the matching channel of `b`.
    pub fn crossover<R>(rng: &mut R, a: &Texture, b: &Texture) -> Texture
    where
        R: Rng,
    {
        Texture {
            r: expr::crossover(rng, &a.r, &b.r),
            g: expr::crossover(rng, &a.g, &b.g),
            b: expr::crossover(rng, &a.b, &b.b),
        }
    }

    /// Apply between `0` and `max_mutations` point mutations to each channel, each at a node
    /// picked uniformly from that channel.
    pub fn mutate<R>(&mut self, rng: &mut R, max_mutations: usize)
    where
        R: Rng,
    {
        for channel in self.channels_mut().iter_mut() {
            let count = rng.gen_range(0..=max_mutations);
            for _ in 0..count {
                let target = channel.pick_uniform_random_node(rng);
                channel.mutate(rng, target);
            }
            trace!("applied {} mutations to a channel", count);
        }
    }
}

impl fmt::Display for Texture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({}, {}, {})", TEXTURE_IDENTIFIER, self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn grow_rejects_zero_budget() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Texture::grow(&mut rng, 0..=4).is_none());
        assert!(Texture::grow(&mut rng, 3..=2).is_none());
        let t = Texture::grow(&mut rng, 1..=4).unwrap();
        assert!(t.channels().iter().all(|c| c.is_complete()));
    }

    #[test]
    fn text_round_trip() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let t = Texture::grow(&mut rng, 1..=12).unwrap();
            let text = t.to_string();
            assert!(text.starts_with("EquationImage("));
            let reread: Texture = text.parse().unwrap();
            assert_eq!(reread.to_string(), text);
            let bits = |rgb: [f32; 3]| rgb.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(reread.eval(0.3, -0.7)), bits(t.eval(0.3, -0.7)));
        }
    }

    #[test]
    fn sample_is_row_major() {
        let t: Texture = "EquationImage(X, Y, 0.5)".parse().unwrap();
        let canvas = Canvas {
            width: 2,
            height: 2,
        };
        let pixels = t.sample(&canvas);
        assert_eq!(
            pixels,
            vec![
                [-1.0, -1.0, 0.5],
                [0.0, -1.0, 0.5],
                [-1.0, 0.0, 0.5],
                [0.0, 0.0, 0.5],
            ]
        );
    }

    #[test]
    fn breeding_keeps_channels_complete() {
        let mut rng = StdRng::seed_from_u64(2);
        let a = Texture::grow(&mut rng, 1..=8).unwrap();
        let b = Texture::grow(&mut rng, 1..=8).unwrap();
        for _ in 0..100 {
            let mut child = Texture::crossover(&mut rng, &a, &b);
            child.mutate(&mut rng, 3);
            assert!(child.channels().iter().all(|c| c.is_complete()));
        }
    }
}
