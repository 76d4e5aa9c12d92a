//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - 2D homogeneous math types and decompositions
//! - Generation-checked handle types
//! - Frame timing and fixed-step accumulation
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
pub mod time;
