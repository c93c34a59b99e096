pub mod system;
pub mod values;
