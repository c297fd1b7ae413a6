//! Deterministic stand-in encoder.
//!
//! Maps each prompt to a reproducible pseudo-random vector so the full
//! pipeline can run without a real text encoder. Vector length grows by
//! one chunk per 77 whitespace tokens, mirroring block-sized encoders.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{Embedding, Encoder};

const CHUNK_TOKENS: usize = 77;

pub struct SeededEncoder {
    seed: u64,
    dims: usize,
}

impl SeededEncoder {
    pub fn new(seed: u64, dims: usize) -> Self {
        Self { seed, dims }
    }

    fn vector(&self, text: &str) -> Embedding {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ hasher.finish());
        let chunks = 1 + text.split_whitespace().count() / CHUNK_TOKENS;
        Embedding::new(
            (0..self.dims * chunks)
                .map(|_| rng.gen_range(-1.0..1.0))
                .collect(),
        )
    }
}

impl Encoder for SeededEncoder {
    fn encode(&self, prompts: &[String]) -> Vec<Embedding> {
        prompts.iter().map(|p| self.vector(p)).collect()
    }

    fn empty(&self) -> Embedding {
        self.vector("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_prompt_same_vector() {
        let enc = SeededEncoder::new(42, 8);
        let a = enc.encode(&["a red fox".to_string()]);
        let b = enc.encode(&["a red fox".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 8);
    }

    #[test]
    fn different_prompts_differ() {
        let enc = SeededEncoder::new(42, 8);
        let out = enc.encode(&["fox".to_string(), "hound".to_string()]);
        assert_ne!(out[0], out[1]);
    }

    #[test]
    fn different_seeds_differ() {
        let a = SeededEncoder::new(1, 8).empty();
        let b = SeededEncoder::new(2, 8).empty();
        assert_ne!(a, b);
    }

    #[test]
    fn long_prompts_grow_by_chunks() {
        let enc = SeededEncoder::new(42, 4);
        let long = vec!["word"; 80].join(" ");
        let out = enc.encode(&[long]);
        assert_eq!(out[0].len(), 8);
        assert_eq!(enc.empty().len(), 4);
    }
}
