//! Conditioning vectors and the encoder boundary.
//!
//! The compiler never embeds text itself. It hands every unique flat
//! prompt to an [`Encoder`] exactly once and works with the returned
//! vectors from then on. Vectors may differ in length by whole chunks
//! (token blocks); before any arithmetic the pipeline pads the shorter
//! ones with the encoder's empty-prompt chunk.

pub mod seeded;

pub use seeded::SeededEncoder;

/// A conditioning vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Componentwise `self + (other - self) * t`.
    pub fn lerp(&self, other: &Embedding, t: f64) -> Embedding {
        let t = t as f32;
        Embedding::new(
            self.values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a + (b - a) * t)
                .collect(),
        )
    }

    pub fn add(&self, other: &Embedding) -> Embedding {
        Embedding::new(
            self.values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a + b)
                .collect(),
        )
    }

    pub fn sub(&self, other: &Embedding) -> Embedding {
        Embedding::new(
            self.values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a - b)
                .collect(),
        )
    }

    pub fn scaled(&self, factor: f64) -> Embedding {
        let factor = factor as f32;
        Embedding::new(self.values.iter().map(|v| v * factor).collect())
    }

    pub fn dot(&self, other: &Embedding) -> f64 {
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a * b) as f64)
            .sum()
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Largest componentwise difference; infinite when lengths differ so
    /// mismatched vectors never compare as mergeable.
    pub fn max_abs_diff(&self, other: &Embedding) -> f64 {
        if self.values.len() != other.values.len() {
            return f64::INFINITY;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).abs() as f64)
            .fold(0.0, f64::max)
    }

    /// Grow to `len` by repeating the filler chunk, then clip exactly.
    pub fn pad_to(&mut self, len: usize, filler: &Embedding) {
        if filler.values.is_empty() || self.values.len() >= len {
            return;
        }
        while self.values.len() < len {
            self.values.extend_from_slice(&filler.values);
        }
        self.values.truncate(len);
    }
}

/// The external text encoder the compiler drives.
pub trait Encoder {
    /// Embed each prompt, one vector per input, order preserved.
    fn encode(&self, prompts: &[String]) -> Vec<Embedding>;

    /// The embedding of the empty prompt, used as the padding chunk.
    fn empty(&self) -> Embedding;
}

/// Pad every vector to the longest one using the filler chunk.
pub fn pad_to_longest(embeddings: &mut [Embedding], filler: &Embedding) {
    let longest = embeddings.iter().map(Embedding::len).max().unwrap_or(0);
    for embedding in embeddings {
        embedding.pad_to(longest, filler);
    }
}
