// Core modules implementing decoding, formatting, and error modeling.
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod notice;
pub mod timestamp;
