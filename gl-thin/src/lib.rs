pub mod api;
pub mod errors;
pub mod gl_fancy;
pub mod gl_helper;
pub mod recording;
