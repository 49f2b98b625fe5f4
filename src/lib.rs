//! Inkpress
//!
//! Blog publishing service with retrieval-augmented answering: posts are
//! chunked and embedded into a vector index; questions are answered from
//! retrieved chunks with live arXiv results alongside.

pub mod config;
pub mod db;
pub mod embeddings;
pub mod errors;
pub mod index;
pub mod llm;
pub mod metrics;
pub mod routes;
pub mod services;
