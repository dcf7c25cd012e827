pub mod config;
pub mod decompose;
pub mod generate;
pub mod output;
pub mod selftest;
pub mod telemetry;
