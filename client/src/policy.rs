//! Who may approve or reject a pending asset.

use collateral_assets_primitives::Address;
use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReviewPolicy {
    /// The submitting wallet reviews its own asset.
    ///
    /// This is how deployed clients behave today. It is probably a placeholder
    /// for a lender/reviewer role and must not be read as a security boundary.
    #[default]
    Owner,
    /// Only the listed wallets review, whoever owns the asset.
    Reviewers { reviewers: Vec<Address> },
}

impl ReviewPolicy {
    /// Checks that do not need the asset record.
    pub fn precheck(&self, reviewer: &Address) -> bool {
        match self {
            ReviewPolicy::Owner => true,
            ReviewPolicy::Reviewers { reviewers } => reviewers.contains(reviewer),
        }
    }

    pub fn authorize(&self, reviewer: &Address, owner: &str) -> bool {
        match self {
            ReviewPolicy::Owner => reviewer.matches(owner),
            ReviewPolicy::Reviewers { .. } => self.precheck(reviewer),
        }
    }
}
