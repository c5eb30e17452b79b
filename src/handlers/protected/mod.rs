pub mod access;
pub mod routes_refresh;
pub mod whoami;

pub use access::access_check;
pub use routes_refresh::routes_refresh;
pub use whoami::whoami;
