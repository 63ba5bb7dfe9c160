pub mod ffmpeg_reader;
pub mod jpeg_thumbnail_writer;
