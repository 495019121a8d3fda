mod providers_errors;
mod providers_traits;

pub use providers_errors::*;
pub use providers_traits::*;
