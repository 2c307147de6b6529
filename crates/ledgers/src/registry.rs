//! Collaborator registry
//!
//! Resolves the handles a request names (exchange address, lending ledger
//! address, asset ids) to injected implementations.

use std::collections::HashMap;
use std::sync::Arc;

use gateway_core::{Address, AssetId, GatewayError};

use crate::{AssetLedger, ExchangeAdapter, LendingLedger};

#[derive(Clone, Default)]
pub struct Registry {
    assets: HashMap<AssetId, Arc<dyn AssetLedger>>,
    exchanges: HashMap<Address, Arc<dyn ExchangeAdapter>>,
    lending_ledgers: HashMap<Address, Arc<dyn LendingLedger>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset ledger under the asset it reports
    pub fn register_asset(&mut self, ledger: Arc<dyn AssetLedger>) -> &mut Self {
        self.assets.insert(ledger.asset(), ledger);
        self
    }

    pub fn register_exchange(&mut self, exchange: Arc<dyn ExchangeAdapter>) -> &mut Self {
        self.exchanges.insert(exchange.address(), exchange);
        self
    }

    pub fn register_lending_ledger(&mut self, ledger: Arc<dyn LendingLedger>) -> &mut Self {
        self.lending_ledgers.insert(ledger.address(), ledger);
        self
    }

    pub fn asset(&self, asset: &AssetId) -> Result<Arc<dyn AssetLedger>, GatewayError> {
        self.assets
            .get(asset)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownCollaborator {
                kind: "asset ledger",
                address: asset.to_string(),
            })
    }

    pub fn exchange(&self, address: &Address) -> Result<Arc<dyn ExchangeAdapter>, GatewayError> {
        self.exchanges
            .get(address)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownCollaborator {
                kind: "exchange",
                address: address.to_string(),
            })
    }

    pub fn lending_ledger(
        &self,
        address: &Address,
    ) -> Result<Arc<dyn LendingLedger>, GatewayError> {
        self.lending_ledgers
            .get(address)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownCollaborator {
                kind: "lending ledger",
                address: address.to_string(),
            })
    }

    pub fn exchange_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.exchanges.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    pub fn lending_ledger_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.lending_ledgers.keys().cloned().collect();
        addresses.sort();
        addresses
    }
}
