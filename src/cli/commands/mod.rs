pub mod access;
pub mod route;
pub mod token;
