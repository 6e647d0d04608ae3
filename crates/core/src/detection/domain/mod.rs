pub mod detection_config;
pub mod face_detector;
pub mod neighbor_grouper;
