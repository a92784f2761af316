use chrono::Utc;
use log::*;

use super::InMemoryConsentManagement;
use crate::{
    traits::{ConsentManagementError, PaymentManagement},
    xs2a_types::{CommonPayment, TransactionStatus},
};

impl PaymentManagement for InMemoryConsentManagement {
    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<CommonPayment>, ConsentManagementError> {
        Ok(self.read().await.payments.get(payment_id).cloned())
    }

    async fn update_payment_status(
        &self,
        payment_id: &str,
        status: TransactionStatus,
    ) -> Result<(), ConsentManagementError> {
        let mut store = self.write().await;
        let payment = store
            .payments
            .get_mut(payment_id)
            .ok_or_else(|| ConsentManagementError::PaymentNotFound(payment_id.to_string()))?;
        if payment.transaction_status.is_finalised_status() {
            return Err(ConsentManagementError::PaymentFinalised {
                id: payment_id.to_string(),
                status: payment.transaction_status,
            });
        }
        payment.transaction_status = status;
        payment.status_change_timestamp = Utc::now();
        debug!("🗃️ Payment {payment_id} is now {status}");
        Ok(())
    }

    async fn update_multilevel_sca(
        &self,
        payment_id: &str,
        multilevel_sca_required: bool,
    ) -> Result<(), ConsentManagementError> {
        let mut store = self.write().await;
        let payment = store
            .payments
            .get_mut(payment_id)
            .ok_or_else(|| ConsentManagementError::PaymentNotFound(payment_id.to_string()))?;
        payment.multilevel_sca_required = multilevel_sca_required;
        trace!("🗃️ Payment {payment_id} multilevel SCA required: {multilevel_sca_required}");
        Ok(())
    }

    async fn fetch_internal_payment_id(&self, payment_id: &str) -> Result<Option<String>, ConsentManagementError> {
        Ok(self.read().await.internal_payment_ids.get(payment_id).cloned())
    }
}
