//! Deterministic character-trigram embeddings.
//!
//! Vectors are built by hashing word trigrams and whole words into a fixed
//! number of buckets and normalising to unit length. The result carries no
//! semantics beyond lexical overlap, which is enough for offline retrieval over
//! a single document and keeps tests free of network access.

use crate::embeddings::provider::EmbeddingProvider;
use inquest_core::AppResult;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// English and Portuguese function words ignored when hashing.
const STOP_WORDS: [&str; 48] = [
    "the", "and", "are", "was", "were", "for", "with", "from", "this", "that", "have", "has",
    "had", "its", "their", "they", "them", "but", "you", "your", "not", "what", "which", "who",
    "uma", "umas", "uns", "dos", "das", "nos", "nas", "para", "por", "com", "que", "não", "mas",
    "foi", "ser", "são", "ele", "ela", "eles", "elas", "isso", "este", "esta", "pelo",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Trigram-based embedding provider for local, offline operation.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str, seed: u64) -> usize {
        let hash = token
            .bytes()
            .fold(seed, |acc, b| acc.wrapping_mul(1_099_511_628_211).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let mut frequencies: HashMap<&str, u32> = HashMap::new();
        for word in lower.unicode_words() {
            if word.chars().count() > 2 && !stop_words().contains(word) {
                *frequencies.entry(word).or_insert(0) += 1;
            }
        }

        for (word, freq) in frequencies {
            let weight = (freq as f32).sqrt();
            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 14_695_981_039_346_656_037)] += weight;
            }
            embedding[self.bucket(word, 5381)] += freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }
        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}
