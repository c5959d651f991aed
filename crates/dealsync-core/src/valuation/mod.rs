pub mod comps;
pub mod dcf;
pub mod football_field;
pub mod sensitivity;
