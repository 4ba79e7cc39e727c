pub mod error;
pub mod value;
pub mod zone;

pub use error::*;
pub use value::*;
pub use zone::*;
