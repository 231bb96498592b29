pub mod input;
pub mod markers;
pub mod output;
pub mod scoring;
