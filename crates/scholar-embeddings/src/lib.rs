//! # scholar-embeddings
//!
//! ONNX-backed text encoders: the bi-encoder [`OnnxEmbedder`] producing
//! unit-norm vectors, and the [`CrossEncoderScorer`] scoring (query, doc)
//! pairs with a bi-encoder cosine fallback when no pair model is present.
//!
//! Both wrap a long-lived `ort` session behind a mutex; the sessions are
//! process singletons released on drop.

pub mod cross_encoder;
pub mod embedder;
pub mod pooling;

pub use cross_encoder::CrossEncoderScorer;
pub use embedder::OnnxEmbedder;
