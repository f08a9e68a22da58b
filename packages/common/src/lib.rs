pub mod care;
pub mod storage;

pub use care::{GrowthRate, LightLevel, ParseChoiceError, Season};
