pub mod health;
pub mod root;
pub mod routes;
pub mod unavailable;

pub use health::health;
pub use root::{not_found, root};
pub use routes::routes_list;
pub use unavailable::unavailable;
