pub mod asset;
pub mod campaign;
pub mod constants;
pub mod error;
pub mod events;
pub mod position;
pub mod types;

pub use asset::{AssetLedger, CollectibleRegistry};
pub use campaign::CampaignSchedule;
pub use constants::*;
pub use error::TenureError;
pub use events::*;
pub use position::*;
pub use types::*;
