pub mod accretion;
pub mod synergy;
