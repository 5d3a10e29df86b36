mod sca_world;
mod steps;

pub use sca_world::ScaWorld;
