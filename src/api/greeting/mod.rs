pub mod handler;
pub mod routes;

pub use handler::{hello_handler, GREETING};
pub use routes::greeting_routes;
