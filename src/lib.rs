//! Purpose: Shared core library crate used by the `diagline` CLI and embedders.
//! Exports: `api` (stable surface) and `core` (notices, diagnostics, config, errors).
//! Role: Library backing the binary; `api` is the supported import path.
//! Invariants: Behavior reachable through `api` stays additive-only.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
