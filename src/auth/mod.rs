pub mod handlers;
pub mod middleware;
pub mod model;
pub mod session;


pub use handlers::*;
pub use middleware::*;
pub use model::*;
pub use session::*;
