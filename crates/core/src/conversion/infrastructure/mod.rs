pub mod converter_factory;
pub mod cpu_gray_converter;
pub mod gpu_context;
pub mod gpu_gray_converter;
