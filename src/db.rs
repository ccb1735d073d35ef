pub use self::error::DatabaseError;
pub use self::executor::QueryExecutor;
pub use self::manager::DatabaseManager;
pub use self::value::{Params, Row, Value};

pub mod error;
pub mod executor;
pub mod manager;
pub mod value;
