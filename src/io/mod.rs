pub mod historical;
pub mod model_store;
pub mod sink;

pub use historical::*;
pub use model_store::*;
pub use sink::*;
