pub mod browse;
pub mod parse;
pub mod sync;
