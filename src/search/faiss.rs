//! Reader for FAISS flat indexes (`IndexFlatL2`, `IndexFlatIP`, `IndexFlat`)
//! as written by `faiss.write_index`, plus exact k-nearest-neighbour search.
//!
//! Layout (little-endian):
//!
//! ```text
//! fourcc      [u8; 4]   "IxF2" | "IxFI" | "IxFl"
//! d           i32
//! ntotal      i64
//! dummy       i64 ×2
//! is_trained  u8
//! metric_type i32       0 = inner product, 1 = L2
//! metric_arg  f32       only present when metric_type > 1
//! count       u64       number of f32 values, == d * ntotal
//! vectors     [f32; count]
//! ```

use bytes::{Buf, BufMut};
use thiserror::Error;

const FOURCC_L2: &[u8; 4] = b"IxF2";
const FOURCC_IP: &[u8; 4] = b"IxFI";
const FOURCC_FLAT: &[u8; 4] = b"IxFl";

const METRIC_INNER_PRODUCT: i32 = 0;
const METRIC_L2: i32 = 1;

#[derive(Debug, Error)]
pub enum IndexFormatError {
    #[error("unsupported index type {0:?}; only flat indexes can be loaded")]
    Unsupported(String),
    #[error("unsupported metric type {0}")]
    UnsupportedMetric(i32),
    #[error("index file truncated while reading {0}")]
    Truncated(&'static str),
    #[error("invalid index header: {0}")]
    InvalidHeader(String),
    #[error("vector payload holds {actual} floats, expected {expected}")]
    PayloadSize { expected: u64, actual: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    L2,
    InnerProduct,
}

impl Metric {
    fn from_code(code: i32) -> Result<Self, IndexFormatError> {
        match code {
            METRIC_INNER_PRODUCT => Ok(Metric::InnerProduct),
            METRIC_L2 => Ok(Metric::L2),
            other => Err(IndexFormatError::UnsupportedMetric(other)),
        }
    }

    fn code(self) -> i32 {
        match self {
            Metric::InnerProduct => METRIC_INNER_PRODUCT,
            Metric::L2 => METRIC_L2,
        }
    }
}

/// Row-major matrix of `ntotal` vectors of dimension `dim`.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    metric: Metric,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize, metric: Metric, vectors: Vec<f32>) -> Result<Self, IndexFormatError> {
        if dim == 0 {
            return Err(IndexFormatError::InvalidHeader("dimension is 0".to_string()));
        }
        if vectors.len() % dim != 0 {
            return Err(IndexFormatError::InvalidHeader(format!(
                "{} floats is not a multiple of dimension {dim}",
                vectors.len()
            )));
        }
        Ok(Self {
            dim,
            metric,
            vectors,
        })
    }

    pub fn from_bytes(mut buf: &[u8]) -> Result<Self, IndexFormatError> {
        need(buf, 4, "fourcc")?;
        let mut fourcc = [0u8; 4];
        buf.copy_to_slice(&mut fourcc);
        if &fourcc != FOURCC_L2 && &fourcc != FOURCC_IP && &fourcc != FOURCC_FLAT {
            return Err(IndexFormatError::Unsupported(
                String::from_utf8_lossy(&fourcc).into_owned(),
            ));
        }

        need(buf, 4 + 8 + 8 + 8 + 1 + 4, "header")?;
        let d = buf.get_i32_le();
        let ntotal = buf.get_i64_le();
        let _dummy = buf.get_i64_le();
        let _dummy = buf.get_i64_le();
        let _is_trained = buf.get_u8();
        let metric_code = buf.get_i32_le();
        if metric_code > 1 {
            need(buf, 4, "metric_arg")?;
            let _metric_arg = buf.get_f32_le();
        }

        if d <= 0 {
            return Err(IndexFormatError::InvalidHeader(format!("dimension {d}")));
        }
        if ntotal < 0 {
            return Err(IndexFormatError::InvalidHeader(format!("ntotal {ntotal}")));
        }

        let metric = Metric::from_code(metric_code)?;
        let expected_metric = match &fourcc {
            f if f == FOURCC_L2 => Some(Metric::L2),
            f if f == FOURCC_IP => Some(Metric::InnerProduct),
            _ => None,
        };
        if expected_metric.is_some_and(|m| m != metric) {
            return Err(IndexFormatError::InvalidHeader(format!(
                "fourcc {} disagrees with metric type {metric_code}",
                String::from_utf8_lossy(&fourcc)
            )));
        }

        need(buf, 8, "vector count")?;
        let count = buf.get_u64_le();
        let expected = (d as u64).checked_mul(ntotal as u64).ok_or_else(|| {
            IndexFormatError::InvalidHeader(format!("{ntotal} vectors of dimension {d}"))
        })?;
        if count != expected {
            return Err(IndexFormatError::PayloadSize {
                expected,
                actual: count,
            });
        }

        let byte_len = count
            .checked_mul(4)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(IndexFormatError::Truncated("vectors"))?;
        need(buf, byte_len, "vectors")?;
        let mut vectors = Vec::with_capacity(count as usize);
        for _ in 0..count {
            vectors.push(buf.get_f32_le());
        }

        Self::new(d as usize, metric, vectors)
    }

    /// Serialize in the same layout `faiss.write_index` produces.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(45 + self.vectors.len() * 4);
        out.put_slice(match self.metric {
            Metric::L2 => FOURCC_L2,
            Metric::InnerProduct => FOURCC_IP,
        });
        out.put_i32_le(self.dim as i32);
        out.put_i64_le(self.len() as i64);
        out.put_i64_le(1 << 20);
        out.put_i64_le(1 << 20);
        out.put_u8(1);
        out.put_i32_le(self.metric.code());
        out.put_u64_le(self.vectors.len() as u64);
        for v in &self.vectors {
            out.put_f32_le(*v);
        }
        out
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.vectors.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Exact k-NN. Returns `(row, score)` pairs, best first, at most
    /// `min(k, len())` of them. Equal scores keep row order.
    pub fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<(usize, f32)>> {
        anyhow::ensure!(
            query.len() == self.dim,
            "Query dimension {} does not match index dimension {}",
            query.len(),
            self.dim
        );

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(row, v)| {
                let score = match self.metric {
                    Metric::L2 => euclidean_distance_squared(query, v),
                    Metric::InnerProduct => dot(query, v),
                };
                (row, score)
            })
            .collect();

        match self.metric {
            Metric::L2 => scored.sort_by(|a, b| a.1.total_cmp(&b.1)),
            Metric::InnerProduct => scored.sort_by(|a, b| b.1.total_cmp(&a.1)),
        }
        scored.truncate(k);
        Ok(scored)
    }
}

fn need(buf: &[u8], n: usize, what: &'static str) -> Result<(), IndexFormatError> {
    if buf.remaining() < n {
        Err(IndexFormatError::Truncated(what))
    } else {
        Ok(())
    }
}

fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
