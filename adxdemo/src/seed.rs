use crate::{config::SeedConfig, impls::DemoApp};
use adx_core::models::{Amount, ContentId};
use anyhow::Context as _;
use tracing::{Level, event};

impl SeedConfig {
    /// Create the configured accounts, items and balances.
    ///
    /// Accounts come first so that items can name their owners. A balance
    /// marked `approve` also lets the custody account pull the whole amount.
    pub fn apply(&self, app: &DemoApp) -> anyhow::Result<()> {
        for account in &self.accounts {
            app.registry.register(
                account.address,
                account.name.clone(),
                account.wallet.unwrap_or(account.address),
                ContentId([0; 32]),
                "",
            );
        }

        for item in &self.items {
            let record = app
                .registry
                .register_item(item.owner, item.kind, 0, item.ipfs, item.name.clone(), "")
                .with_context(|| format!("seeding {} owned by {}", item.kind, item.owner))?;
            event!(Level::INFO, item = %record.item(), owner = %record.owner, "seeded item");
        }

        for balance in &self.balances {
            let amount = Amount::from(balance.amount);
            app.ledger
                .mint(&balance.address, amount)
                .with_context(|| format!("seeding balance of {}", balance.address))?;
            if balance.approve {
                app.ledger.approve(&balance.address, &app.custody, amount);
            }
        }

        event!(
            Level::INFO,
            accounts = self.accounts.len(),
            items = self.items.len(),
            balances = self.balances.len(),
            "seed applied"
        );
        Ok(())
    }
}
