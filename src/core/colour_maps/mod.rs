pub mod errors;
pub mod list_colour_map;
