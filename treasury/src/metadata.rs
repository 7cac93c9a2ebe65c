//! Coin metadata

use serde::{Deserialize, Serialize};

use warden_governance::MetadataUpdate;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub icon_url: String,
}

impl From<MetadataUpdate> for CoinMetadata {
    fn from(update: MetadataUpdate) -> Self {
        Self {
            name: update.name,
            symbol: update.symbol,
            description: update.description,
            icon_url: update.icon_url,
        }
    }
}
