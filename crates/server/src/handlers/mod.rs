//! HTTP request handlers.

pub mod affordances;
pub mod common;
pub mod images;
pub mod thumbnails;

pub use affordances::*;
pub use common::not_found;
pub use images::*;
pub use thumbnails::*;
