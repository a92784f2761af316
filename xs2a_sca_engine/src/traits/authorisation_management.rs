use crate::{
    traits::{AuthorisationUpdate, ConsentManagementError},
    xs2a_types::{Authorisation, AuthenticationObject, ScaApproach, ScaStatus},
};

#[allow(async_fn_in_trait)]
pub trait AuthorisationManagement {
    async fn fetch_authorisation(&self, authorisation_id: &str)
        -> Result<Option<Authorisation>, ConsentManagementError>;

    async fn update_authorisation_status(
        &self,
        authorisation_id: &str,
        status: ScaStatus,
    ) -> Result<(), ConsentManagementError>;

    /// Store the SCA methods offered to the PSU for this authorisation, replacing any previous list.
    async fn save_authentication_methods(
        &self,
        authorisation_id: &str,
        methods: &[AuthenticationObject],
    ) -> Result<(), ConsentManagementError>;

    async fn update_sca_approach(
        &self,
        authorisation_id: &str,
        approach: ScaApproach,
    ) -> Result<(), ConsentManagementError>;

    /// True if `authentication_method_id` is one of the methods stored for the authorisation and is decoupled.
    async fn is_authentication_method_decoupled(
        &self,
        authorisation_id: &str,
        authentication_method_id: &str,
    ) -> Result<bool, ConsentManagementError>;

    /// Persist the outcome of a processing step.
    async fn update_authorisation(&self, update: AuthorisationUpdate) -> Result<(), ConsentManagementError>;
}
