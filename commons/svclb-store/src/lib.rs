pub mod error;
pub mod memory;
pub mod models;
pub mod traits;

pub use error::StoreError;
pub use models::*;
pub use traits::*;
