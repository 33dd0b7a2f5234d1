pub mod error;
pub mod intensity_format;
pub mod record;
pub mod sample;

pub use error::*;
pub use intensity_format::*;
pub use record::*;
pub use sample::*;
