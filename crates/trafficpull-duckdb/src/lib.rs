pub mod backend;
pub mod schema;

pub use backend::DuckDbPropertySource;
