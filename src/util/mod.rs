pub mod alphabet;
pub mod bits;
pub mod size;
