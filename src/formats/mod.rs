pub mod gif;
pub mod jpeg;
pub mod mp4;
pub mod png;
