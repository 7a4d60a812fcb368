//! Deterministic stand-ins for the network and model collaborators, plus
//! fixture writers shared by the integration and CLI tests.

pub mod chat;
pub mod embedder;
pub mod pages;
pub mod runtime;
