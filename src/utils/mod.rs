pub mod locks;
pub mod time;
pub mod token;
pub mod validation;
