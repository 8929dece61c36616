//! Test helper utilities shared by the waveplot integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod fake_registry;

pub use audio_generator::{generate_test_wav, write_garbage, AudioConfig};
pub use fake_registry::FakeRegistry;
