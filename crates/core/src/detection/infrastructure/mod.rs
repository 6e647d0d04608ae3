pub mod cascade_detector;
pub mod haar_model;
pub mod integral_image;
