#![allow(dead_code)]

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{png_bytes, seeded_bytes, write_png};
