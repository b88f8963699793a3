pub mod pixels;
pub mod png;
