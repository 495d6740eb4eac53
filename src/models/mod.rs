pub mod identity;
pub mod message;
pub mod pattern;
pub mod sample;

pub use identity::*;
pub use message::*;
pub use pattern::*;
pub use sample::*;
