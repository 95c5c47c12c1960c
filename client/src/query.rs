//! Read-only views over the registry's working set.

use collateral_assets_primitives::{Asset, AssetStatus};

/// Dashboard filter: free-text search plus an optional status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetFilter {
    /// Case-insensitive substring of the game name or asset type.
    pub search: Option<String>,
    pub status: Option<AssetStatus>,
}

impl AssetFilter {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: AssetStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        let status_ok = self.status.map_or(true, |s| s == asset.status);
        let search_ok = match self.search.as_deref().map(str::to_lowercase) {
            None => true,
            Some(term) => {
                asset.game_name.to_lowercase().contains(&term)
                    || asset.asset_type.to_lowercase().contains(&term)
            }
        };
        status_ok && search_ok
    }
}

/// Per-status counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl RegistryStats {
    pub fn from_assets<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> Self {
        assets.into_iter().fold(Self::default(), |mut stats, asset| {
            stats.total += 1;
            match asset.status {
                AssetStatus::Pending => stats.pending += 1,
                AssetStatus::Approved => stats.approved += 1,
                AssetStatus::Rejected => stats.rejected += 1,
            }
            stats
        })
    }
}
