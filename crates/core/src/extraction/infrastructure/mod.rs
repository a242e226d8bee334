pub mod intensity_extractor;
