//! Seeded sandbox world

use std::sync::Arc;

use gateway_core::{constants::NATIVE_DECIMALS, Address, Amount, AssetId, Rate, SandboxConfig};
use ledgers::{AssetLedger, Registry};

use crate::{InMemoryAssetLedger, LedgerSnapshot, MockExchange, ReferenceLendingLedger};

const PRINCIPAL_DECIMALS: u8 = 18;

/// One of everything the gateway talks to, wired together
pub struct World {
    pub native: Arc<InMemoryAssetLedger>,
    pub principal: Arc<InMemoryAssetLedger>,
    pub exchange: Arc<MockExchange>,
    pub lending: Arc<ReferenceLendingLedger>,
}

/// Ledger and loan state of a whole world at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub native: LedgerSnapshot,
    pub principal: LedgerSnapshot,
    /// (requested, funded, owner) per loan, in id order
    pub loans: Vec<(Amount, Amount, Option<Address>)>,
}

impl World {
    /// Build the collaborators named by `config`.
    ///
    /// The exchange is stocked with `exchange_reserve_units` of the principal
    /// token and quotes native -> principal at `rate_units`.
    pub async fn seed(config: &SandboxConfig) -> Self {
        let native = Arc::new(InMemoryAssetLedger::new(AssetId::Native, NATIVE_DECIMALS));
        let principal_asset = AssetId::Token(config.principal_token.clone());
        let principal = Arc::new(InMemoryAssetLedger::new(
            principal_asset.clone(),
            PRINCIPAL_DECIMALS,
        ));

        let exchange = Arc::new(MockExchange::new(
            config.exchange.clone(),
            [
                native.clone() as Arc<dyn AssetLedger>,
                principal.clone() as Arc<dyn AssetLedger>,
            ],
        ));
        let lending = Arc::new(ReferenceLendingLedger::new(
            config.lending_ledger.clone(),
            principal.clone(),
        ));

        let reserve = config.exchange_reserve_units as Amount * 10u128.pow(PRINCIPAL_DECIMALS as u32);
        principal.mint(&config.exchange, reserve).await;
        exchange
            .set_rate(
                &AssetId::Native,
                &principal_asset,
                Rate::from_units(config.rate_units),
            )
            .await;

        tracing::info!(
            exchange = %config.exchange,
            lending_ledger = %config.lending_ledger,
            principal = %principal_asset,
            rate_units = config.rate_units,
            "Sandbox world seeded"
        );

        Self {
            native,
            principal,
            exchange,
            lending,
        }
    }

    /// Registry holding every collaborator of this world
    pub fn registry(&self) -> Registry {
        let mut registry = Registry::new();
        registry
            .register_asset(self.native.clone())
            .register_asset(self.principal.clone())
            .register_exchange(self.exchange.clone())
            .register_lending_ledger(self.lending.clone());
        registry
    }

    pub fn principal_asset(&self) -> AssetId {
        self.principal.asset()
    }

    /// Ledger balance of `asset` for `holder`
    pub async fn balance(&self, asset: &AssetId, holder: &Address) -> Amount {
        if asset.is_native() {
            self.native.balance_of(holder).await
        } else {
            self.principal.balance_of(holder).await
        }
    }

    pub async fn snapshot(&self) -> WorldSnapshot {
        use ledgers::LendingLedger;

        let mut loans = Vec::new();
        let mut loan_id = 0;
        while let Some(target) = self.lending.loan(loan_id).await {
            loans.push((
                target.requested_principal,
                target.current_funded_amount,
                self.lending.owner_of(loan_id).await,
            ));
            loan_id += 1;
        }

        WorldSnapshot {
            native: self.native.snapshot().await,
            principal: self.principal.snapshot().await,
            loans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgers::ExchangeAdapter;

    #[tokio::test]
    async fn test_seed_from_defaults() {
        let config = SandboxConfig::default();
        let world = World::seed(&config).await;

        let registry = world.registry();
        assert!(registry.exchange(&config.exchange).is_ok());
        assert!(registry.lending_ledger(&config.lending_ledger).is_ok());
        assert!(registry.asset(&AssetId::Native).is_ok());
        assert!(registry.asset(&world.principal_asset()).is_ok());

        let quoted = world
            .exchange
            .get_expected_rate(&AssetId::Native, &world.principal_asset(), 1)
            .await
            .unwrap();
        assert_eq!(quoted.expected, Rate::from_units(5000));
        assert_eq!(
            world.balance(&world.principal_asset(), &config.exchange).await,
            1_000_000 * 10u128.pow(18)
        );
    }

    #[tokio::test]
    async fn test_snapshot_tracks_loans() {
        let world = World::seed(&SandboxConfig::default()).await;
        let before = world.snapshot().await;
        world
            .lending
            .create_loan(&Address::from_low_u64(2), 2000)
            .await;
        let after = world.snapshot().await;

        assert_ne!(before, after);
        assert_eq!(after.loans, vec![(2000, 0, None)]);
    }
}
