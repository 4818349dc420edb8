pub use rate::RateCounter;

pub mod rate;
pub mod recent_channel;
