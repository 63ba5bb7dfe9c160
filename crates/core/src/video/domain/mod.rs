pub mod thumbnail_writer;
pub mod video_reader;
