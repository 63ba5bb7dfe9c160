pub mod gray_converter;
