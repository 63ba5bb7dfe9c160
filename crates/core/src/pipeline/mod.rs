pub mod sample_schedule;
pub mod scan_logger;
pub mod select_face_use_case;
