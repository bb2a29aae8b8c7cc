pub mod accumulator;
pub mod catalog;
pub mod genres;
pub mod normalize;
pub mod pagination;
pub mod providers;
pub mod quality;
pub mod ranking;
pub mod recommendations;
