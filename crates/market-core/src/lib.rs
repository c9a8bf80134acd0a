pub mod error;
pub mod pagination;
pub mod recommendation;
pub mod traits;
pub mod types;

pub use error::*;
pub use pagination::{paginate, pages, Page, PaginationState};
pub use recommendation::*;
pub use traits::*;
pub use types::*;
