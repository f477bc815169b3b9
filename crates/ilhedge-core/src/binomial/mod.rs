pub mod one_period;
pub mod sensitivity;
