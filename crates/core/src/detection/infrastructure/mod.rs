pub mod cascade_detector;
pub mod haar_cascade;
pub mod integral_image;
mod math;
pub mod model_resolver;
pub mod neighbor_grouping;
