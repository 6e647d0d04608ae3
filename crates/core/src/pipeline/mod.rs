pub mod capture_loop;
pub mod detect_faces_use_case;
pub mod detection_result;
