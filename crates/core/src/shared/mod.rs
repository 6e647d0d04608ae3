pub mod bounding_box;
pub mod constants;
pub mod frame;
pub mod gray_buffer;
pub mod palette;
