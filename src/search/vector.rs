use anyhow::{Context, Result};
use std::path::Path;

use crate::models::{ChunkHit, ChunkMetadata};
use crate::search::faiss::{FlatIndex, Metric};

/// Read-only chunk index: the prebuilt vectors plus their parallel metadata.
pub struct ChunkIndex {
    vectors: FlatIndex,
    metadata: Vec<ChunkMetadata>,
}

impl ChunkIndex {
    pub fn new(vectors: FlatIndex, metadata: Vec<ChunkMetadata>) -> Result<Self> {
        anyhow::ensure!(
            vectors.len() == metadata.len(),
            "Index holds {} vectors but metadata has {} entries",
            vectors.len(),
            metadata.len()
        );
        Ok(Self { vectors, metadata })
    }

    /// Load the index file and its metadata JSON from disk.
    pub fn load(index_path: &Path, metadata_path: &Path) -> Result<Self> {
        let raw = std::fs::read(index_path)
            .with_context(|| format!("Failed to read vector index {}", index_path.display()))?;
        let vectors = FlatIndex::from_bytes(&raw)
            .with_context(|| format!("Failed to parse vector index {}", index_path.display()))?;

        let data = std::fs::read_to_string(metadata_path).with_context(|| {
            format!("Failed to read chunk metadata {}", metadata_path.display())
        })?;
        let metadata: Vec<ChunkMetadata> = serde_json::from_str(&data).with_context(|| {
            format!("Failed to parse chunk metadata {}", metadata_path.display())
        })?;

        let index = Self::new(vectors, metadata)?;
        tracing::info!(
            "Loaded {} chunks (dimension {}, {:?})",
            index.len(),
            index.dimension(),
            index.vectors.metric()
        );
        Ok(index)
    }

    /// Nearest chunks to `query_embedding`, best first.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ChunkHit>> {
        let ranked = self.vectors.search(query_embedding, limit)?;

        Ok(ranked
            .into_iter()
            .map(|(row, score)| {
                let md = &self.metadata[row];
                ChunkHit {
                    row,
                    text: md.text.clone(),
                    source: md.source.clone(),
                    title: md.title.clone(),
                    score,
                }
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    pub fn metric(&self) -> Metric {
        self.vectors.metric()
    }
}
