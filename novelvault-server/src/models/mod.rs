//! Request models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod account;
pub mod comment;
pub mod pagination;
pub mod profile;
pub mod rating;
pub mod validation;

pub use account::{Email, Password, Username};
pub use comment::CommentBody;
pub use pagination::{page_window, Paginated, Pagination, PaginationParams};
pub use profile::ProfileUpdate;
pub use rating::{round_average, Score};
pub use validation::ValidationError;
