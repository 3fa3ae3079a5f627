//! Cross-module tests for essay analysis
//!
//! Orchestration scenarios run on paused tokio time against a scripted
//! invoker; the Gemini client is exercised against a WireMock server.

pub mod support;
