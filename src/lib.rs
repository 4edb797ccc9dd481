//! # course-qa
//!
//! A virtual teaching assistant for the Tools in Data Science course. Students
//! POST a question (optionally with a screenshot) and get back an answer
//! grounded in course and forum content, with links to the sources.
//!
//! ## Request flow
//!
//! ```text
//!        ┌──────────────────────────┐
//!        │ question (+ base64 image)│
//!        └────────────┬─────────────┘
//!                     ▼
//!        ┌──────────────────────────┐
//!        │  OCR (tesseract)         │  image only; failure → 400
//!        └────────────┬─────────────┘
//!                     ▼
//!        ┌──────────────────────────┐
//!        │  Canned answer?          │──── yes ──▶ fixed answer + links
//!        └────────────┬─────────────┘
//!                     ▼ no
//!        ┌──────────────────────────┐
//!        │  Embed question + OCR    │  embeddings API
//!        └────────────┬─────────────┘
//!                     ▼
//!        ┌──────────────────────────┐
//!        │  Exact k-NN over the     │  static flat index, top 5
//!        │  prebuilt chunk index    │
//!        └────────────┬─────────────┘
//!                     ▼
//!        ┌──────────────────────────┐
//!        │  Chat completion         │  system rules + retrieved context
//!        └────────────┬─────────────┘
//!                     ▼
//!        ┌──────────────────────────┐
//!        │  answer + source links   │
//!        └──────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, index files, LLM and OCR
//! - [`models`] - Request/response types and chunk metadata
//! - [`search::faiss`] - Reader for FAISS flat index files with exact k-NN search
//! - [`search::vector`] - The loaded chunk index: vectors plus parallel metadata
//! - [`llm::embeddings`] - Query embedding via OpenAI-compatible or Ollama APIs
//! - [`llm::chat`] - Non-streaming chat completion
//! - [`ocr`] - Base64 image decoding and Tesseract text extraction
//! - [`canned`] - Fixed answers for known questions
//! - [`api`] - Axum router and handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod canned;
pub mod config;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod search;
pub mod state;
