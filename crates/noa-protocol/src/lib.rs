pub mod feedback;
pub mod knowledge;
pub mod request;
pub mod staging;

pub use feedback::*;
pub use knowledge::*;
pub use request::*;
pub use staging::*;
