//! Static vector retrieval: the on-disk flat index reader and the in-memory
//! chunk index built on top of it.

pub mod faiss;
pub mod vector;
