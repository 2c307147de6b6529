//! Reference lending ledger
//!
//! Loans escrow lender principal at the ledger's own address until the
//! requested principal is complete, then pay it to the borrower in one
//! transfer and record the completing lender's beneficiary as owner.

use std::sync::Arc;

use async_trait::async_trait;
use gateway_core::{Address, Amount, AssetId, LoanId};
use ledgers::{AssetLedger, FundingReceipt, LendingError, LendingLedger, LoanTarget};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Loan {
    borrower: Address,
    requested: Amount,
    funded: Amount,
    owner: Option<Address>,
}

impl Loan {
    fn is_complete(&self) -> bool {
        self.funded >= self.requested
    }
}

pub struct ReferenceLendingLedger {
    address: Address,
    principal: Arc<dyn AssetLedger>,
    loans: Mutex<Vec<Loan>>,
}

impl ReferenceLendingLedger {
    pub fn new(address: Address, principal: Arc<dyn AssetLedger>) -> Self {
        Self {
            address,
            principal,
            loans: Mutex::new(Vec::new()),
        }
    }

    /// Open a loan request; ids are assigned sequentially from zero
    pub async fn create_loan(&self, borrower: &Address, principal: Amount) -> LoanId {
        let mut loans = self.loans.lock().await;
        loans.push(Loan {
            borrower: borrower.clone(),
            requested: principal,
            funded: 0,
            owner: None,
        });
        let loan_id = (loans.len() - 1) as LoanId;
        tracing::debug!(loan_id, borrower = %borrower, principal, "Reference ledger: loan created");
        loan_id
    }

    pub async fn borrower_of(&self, loan_id: LoanId) -> Option<Address> {
        let loans = self.loans.lock().await;
        loans.get(loan_id as usize).map(|loan| loan.borrower.clone())
    }
}

#[async_trait]
impl LendingLedger for ReferenceLendingLedger {
    fn address(&self) -> Address {
        self.address.clone()
    }

    fn principal_asset(&self) -> AssetId {
        self.principal.asset()
    }

    async fn loan(&self, loan_id: LoanId) -> Option<LoanTarget> {
        let loans = self.loans.lock().await;
        loans.get(loan_id as usize).map(|loan| LoanTarget {
            ledger: self.address.clone(),
            loan_id,
            requested_principal: loan.requested,
            current_funded_amount: loan.funded,
        })
    }

    async fn fund_loan(
        &self,
        funder: &Address,
        loan_id: LoanId,
        amount: Amount,
        beneficiary: &Address,
    ) -> Result<FundingReceipt, LendingError> {
        let mut loans = self.loans.lock().await;
        let loan = loans
            .get_mut(loan_id as usize)
            .ok_or(LendingError::UnknownLoan(loan_id))?;

        if loan.is_complete() {
            return Err(LendingError::Closed { loan_id });
        }
        let remaining = loan.requested - loan.funded;
        if amount > remaining {
            return Err(LendingError::ExceedsRemaining {
                loan_id,
                requested: amount,
                remaining,
            });
        }
        if amount == 0
            || !self
                .principal
                .transfer_from(&self.address, funder, &self.address, amount)
                .await
        {
            return Err(LendingError::PaymentFailed { loan_id, amount });
        }

        loan.funded += amount;
        if loan.is_complete() {
            if !self
                .principal
                .transfer(&self.address, &loan.borrower, loan.requested)
                .await
            {
                loan.funded -= amount;
                if !self.principal.transfer(&self.address, funder, amount).await {
                    tracing::error!(loan_id, funder = %funder, amount, "Reference ledger: escrow refund failed");
                }
                return Err(LendingError::PaymentFailed { loan_id, amount });
            }
            loan.owner = Some(beneficiary.clone());
        }

        Ok(FundingReceipt {
            loan_id,
            funder: funder.clone(),
            beneficiary: beneficiary.clone(),
            amount,
            funded_after: loan.funded,
            fully_funded: loan.is_complete(),
        })
    }

    async fn unfund_loan(&self, funder: &Address, receipt: &FundingReceipt) -> bool {
        let mut loans = self.loans.lock().await;
        let Some(loan) = loans.get_mut(receipt.loan_id as usize) else {
            return false;
        };
        if &receipt.funder != funder || loan.funded < receipt.amount {
            return false;
        }

        let was_complete = loan.is_complete();
        if was_complete {
            // Only the funding that completed the loan can reopen it
            if !receipt.fully_funded
                || !self
                    .principal
                    .clawback(&self.address, &loan.borrower, loan.requested)
                    .await
            {
                return false;
            }
        }

        if !self
            .principal
            .transfer(&self.address, funder, receipt.amount)
            .await
        {
            if was_complete
                && !self
                    .principal
                    .transfer(&self.address, &loan.borrower, loan.requested)
                    .await
            {
                tracing::error!(loan_id = receipt.loan_id, "Reference ledger: could not re-disburse loan");
            }
            return false;
        }

        loan.funded -= receipt.amount;
        if was_complete {
            loan.owner = None;
        }
        true
    }

    async fn owner_of(&self, loan_id: LoanId) -> Option<Address> {
        let loans = self.loans.lock().await;
        loans.get(loan_id as usize).and_then(|loan| loan.owner.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryAssetLedger;

    fn ledger_address() -> Address {
        Address::from_low_u64(0x1e4d)
    }

    fn lender() -> Address {
        Address::from_low_u64(0x6a7e)
    }

    fn borrower() -> Address {
        Address::from_low_u64(2)
    }

    fn payer() -> Address {
        Address::from_low_u64(3)
    }

    async fn setup(balance: Amount) -> (Arc<InMemoryAssetLedger>, ReferenceLendingLedger) {
        let token = Arc::new(InMemoryAssetLedger::new(
            AssetId::Token(Address::from_low_u64(0x7c4)),
            18,
        ));
        token.mint(&lender(), balance).await;
        assert!(token.approve(&lender(), &ledger_address(), balance).await);
        let ledger = ReferenceLendingLedger::new(ledger_address(), token.clone());
        (token, ledger)
    }

    #[tokio::test]
    async fn test_partial_then_complete_funding() {
        let (token, ledger) = setup(2000).await;
        let loan_id = ledger.create_loan(&borrower(), 2000).await;

        let first = ledger
            .fund_loan(&lender(), loan_id, 1500, &payer())
            .await
            .unwrap();
        assert!(!first.fully_funded);
        assert_eq!(ledger.owner_of(loan_id).await, None);
        assert_eq!(token.balance_of(&borrower()).await, 0);

        let second = ledger
            .fund_loan(&lender(), loan_id, 500, &payer())
            .await
            .unwrap();
        assert!(second.fully_funded);
        assert_eq!(ledger.owner_of(loan_id).await, Some(payer()));
        assert_eq!(token.balance_of(&borrower()).await, 2000);
    }

    #[tokio::test]
    async fn test_funding_beyond_remaining_is_refused() {
        let (_token, ledger) = setup(5000).await;
        let loan_id = ledger.create_loan(&borrower(), 2000).await;

        let err = ledger
            .fund_loan(&lender(), loan_id, 2001, &payer())
            .await
            .unwrap_err();
        assert!(matches!(err, LendingError::ExceedsRemaining { remaining: 2000, .. }));

        ledger
            .fund_loan(&lender(), loan_id, 2000, &payer())
            .await
            .unwrap();
        let err = ledger
            .fund_loan(&lender(), loan_id, 1, &payer())
            .await
            .unwrap_err();
        assert_eq!(err, LendingError::Closed { loan_id });
    }

    #[tokio::test]
    async fn test_unfund_reopens_completed_loan() {
        let (token, ledger) = setup(2000).await;
        let loan_id = ledger.create_loan(&borrower(), 2000).await;

        let receipt = ledger
            .fund_loan(&lender(), loan_id, 2000, &payer())
            .await
            .unwrap();
        assert!(ledger.unfund_loan(&lender(), &receipt).await);

        assert_eq!(ledger.owner_of(loan_id).await, None);
        assert_eq!(ledger.loan(loan_id).await.unwrap().current_funded_amount, 0);
        assert_eq!(token.balance_of(&lender()).await, 2000);
        assert_eq!(token.balance_of(&borrower()).await, 0);
    }

    #[tokio::test]
    async fn test_unfund_partial_funding() {
        let (token, ledger) = setup(2000).await;
        let loan_id = ledger.create_loan(&borrower(), 2000).await;

        let receipt = ledger
            .fund_loan(&lender(), loan_id, 700, &payer())
            .await
            .unwrap();
        assert!(ledger.unfund_loan(&lender(), &receipt).await);
        assert!(!ledger.unfund_loan(&lender(), &receipt).await);

        assert_eq!(token.balance_of(&lender()).await, 2000);
        assert_eq!(token.balance_of(&ledger_address()).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_loan() {
        let (_token, ledger) = setup(10).await;
        assert!(ledger.loan(7).await.is_none());
        let err = ledger
            .fund_loan(&lender(), 7, 1, &payer())
            .await
            .unwrap_err();
        assert_eq!(err, LendingError::UnknownLoan(7));
    }
}
