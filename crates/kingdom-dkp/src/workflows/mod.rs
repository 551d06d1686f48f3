pub mod dkp;
pub mod roster;
