pub mod catalog;
pub mod clustering;
pub mod demand;
pub mod eta;
pub mod pipeline;
pub mod sequencing;
pub mod travel_time;
pub mod trigger;
