pub mod driver;
pub mod matchmaking;
pub mod registry;

pub use driver::RoundTiming;
pub use registry::RoomRegistry;
