pub mod encoding;
pub mod errors;
pub mod html;
pub mod input_stream;
pub mod signal;
