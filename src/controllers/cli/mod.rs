pub mod calc_file;
