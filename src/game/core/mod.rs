pub mod messages;
pub mod player;
pub mod room;
pub mod round;

pub use player::PlayerSession;
pub use room::{Room, RoomStatus};
pub use round::{BiddingRound, Phase};
