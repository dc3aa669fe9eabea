pub mod arithmetic;
pub mod spelling;

pub use arithmetic::*;
pub use spelling::*;
