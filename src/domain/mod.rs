pub mod forecast;
pub mod records;

pub use forecast::*;
pub use records::*;
