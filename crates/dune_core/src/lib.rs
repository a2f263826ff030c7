pub mod animation;
pub mod behavior;
pub mod input;
pub mod lighting;
pub mod obstacles;
pub mod params;
pub mod simulation;
pub mod surface;
pub mod time;
