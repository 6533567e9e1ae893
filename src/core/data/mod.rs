pub mod calc_options;
pub mod colour;
pub mod complex;
pub mod formula_param;
pub mod image_buffer;
pub mod pixel_buffer;
pub mod point;
pub mod position_params;
pub mod resolution;
