pub mod calculate_bands;
pub mod calculate_threads;
pub mod pixel_to_view_coords;
