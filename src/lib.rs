//! Cleaning, resampling and summarising of per-workload benchmark logs.

pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod report;
