use crate::{
    traits::ConsentManagementError,
    xs2a_types::{CommonPayment, TransactionStatus},
};

#[allow(async_fn_in_trait)]
pub trait PaymentManagement {
    /// Fetch the payment with the given (encrypted) id. If the payment does not exist, `Ok(None)` is returned.
    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<CommonPayment>, ConsentManagementError>;

    async fn update_payment_status(
        &self,
        payment_id: &str,
        status: TransactionStatus,
    ) -> Result<(), ConsentManagementError>;

    async fn update_multilevel_sca(&self, payment_id: &str, multilevel_sca_required: bool)
        -> Result<(), ConsentManagementError>;

    /// Resolve the ASPSP's internal payment id from the encrypted id the TPP uses. Returns `Ok(None)` when no
    /// mapping exists.
    async fn fetch_internal_payment_id(&self, payment_id: &str) -> Result<Option<String>, ConsentManagementError>;
}
