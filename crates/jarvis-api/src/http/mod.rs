//! HTTP/REST API layer for Jarvis.
//!
//! Axum-based JSON API: `POST /chat` plus the readiness and health probes.
//! Every error body has the shape `{"detail": "..."}`.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
