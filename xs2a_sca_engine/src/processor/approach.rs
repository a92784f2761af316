use std::{collections::HashMap, fmt::Debug};

use log::*;

use crate::{
    processor::{
        errors::{ApproachRegistryError, AuthorisationProcessorError},
        objects::CommonAuthorisationParameters,
        response::AuthorisationProcessorResponse,
    },
    traits::{AuthorisationManagement, AuthorisationUpdate, ConsentManagementError},
    xs2a_types::{ScaApproach, ServiceType},
};

/// Persists the outcome of a processing step for one SCA approach.
#[allow(async_fn_in_trait)]
pub trait ScaApproachHandler {
    fn sca_approach(&self) -> ScaApproach;

    async fn update_authorisation(
        &self,
        parameters: &CommonAuthorisationParameters,
        response: &AuthorisationProcessorResponse,
    ) -> Result<(), ConsentManagementError>;
}

//--------------------------------------    ApproachRegistry   --------------------------------------------------------
/// SCA approach handlers, keyed by approach. Built once when a processor is constructed.
pub struct ApproachRegistry<H> {
    handlers: HashMap<ScaApproach, H>,
}

impl<H> Debug for ApproachRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut approaches = self.handlers.keys().map(ToString::to_string).collect::<Vec<_>>();
        approaches.sort();
        write!(f, "ApproachRegistry [{}]", approaches.join(", "))
    }
}

impl<H: ScaApproachHandler> ApproachRegistry<H> {
    /// Every approach in `supported` must have exactly one handler. Handlers for approaches the ASPSP does not
    /// support are accepted and simply never resolved by a well-behaved caller.
    pub fn new(handlers: Vec<H>, supported: &[ScaApproach]) -> Result<Self, ApproachRegistryError> {
        let mut map = HashMap::with_capacity(handlers.len());
        for handler in handlers {
            let approach = handler.sca_approach();
            if map.insert(approach, handler).is_some() {
                return Err(ApproachRegistryError::DuplicateHandler(approach));
            }
        }
        if let Some(missing) = supported.iter().find(|a| !map.contains_key(*a)) {
            return Err(ApproachRegistryError::MissingHandler(*missing));
        }
        Ok(Self { handlers: map })
    }

    pub fn resolve(
        &self,
        approach: ScaApproach,
        service_type: ServiceType,
    ) -> Result<&H, AuthorisationProcessorError> {
        self.handlers.get(&approach).ok_or(AuthorisationProcessorError::ServiceNotFound { service_type, approach })
    }

    pub fn contains(&self, approach: ScaApproach) -> bool {
        self.handlers.contains_key(&approach)
    }
}

//-------------------------------------- StoredAuthorisationHandler --------------------------------------------------
/// Writes the new SCA status, PSU and chosen method back to the authorisation record.
///
/// Error responses are not persisted here. Where an error must change the stored status (e.g. invalid credentials),
/// the processor has already done so.
#[derive(Clone)]
pub struct StoredAuthorisationHandler<A> {
    approach: ScaApproach,
    authorisations: A,
}

impl<A> Debug for StoredAuthorisationHandler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoredAuthorisationHandler ({})", self.approach)
    }
}

impl<A> StoredAuthorisationHandler<A> {
    pub fn new(approach: ScaApproach, authorisations: A) -> Self {
        Self { approach, authorisations }
    }
}

impl<A: Clone> StoredAuthorisationHandler<A> {
    /// One handler per approach, all sharing the same backend.
    pub fn for_approaches(authorisations: A, approaches: &[ScaApproach]) -> Vec<Self> {
        approaches.iter().map(|a| Self::new(*a, authorisations.clone())).collect()
    }
}

impl<A: AuthorisationManagement> ScaApproachHandler for StoredAuthorisationHandler<A> {
    fn sca_approach(&self) -> ScaApproach {
        self.approach
    }

    async fn update_authorisation(
        &self,
        parameters: &CommonAuthorisationParameters,
        response: &AuthorisationProcessorResponse,
    ) -> Result<(), ConsentManagementError> {
        if let Some(error) = response.error_holder() {
            debug!(
                "🔐️ [{}] Authorisation {} not updated. The step failed with {error}",
                self.approach, parameters.authorisation_id
            );
            return Ok(());
        }
        let psu_id_data = response.psu_data().or(parameters.psu_data.as_ref()).cloned();
        let authentication_method_id = response
            .chosen_sca_method()
            .map(|m| m.authentication_method_id.clone())
            .or_else(|| parameters.authentication_method_id.clone());
        let update = AuthorisationUpdate {
            authorisation_id: parameters.authorisation_id.clone(),
            sca_status: response.sca_status(),
            psu_id_data,
            authentication_method_id,
            sca_approach: response.sca_approach(),
        };
        trace!("🔐️ [{}] Updating authorisation: {update:?}", self.approach);
        self.authorisations.update_authorisation(update).await?;
        debug!(
            "🔐️ [{}] Authorisation {} is now {}",
            self.approach,
            parameters.authorisation_id,
            response.sca_status()
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug)]
    struct NoopHandler(ScaApproach);

    impl ScaApproachHandler for NoopHandler {
        fn sca_approach(&self) -> ScaApproach {
            self.0
        }

        async fn update_authorisation(
            &self,
            _parameters: &CommonAuthorisationParameters,
            _response: &AuthorisationProcessorResponse,
        ) -> Result<(), ConsentManagementError> {
            Ok(())
        }
    }

    #[test]
    fn every_supported_approach_needs_a_handler() {
        let handlers = vec![NoopHandler(ScaApproach::Embedded)];
        let err = ApproachRegistry::new(handlers, &[ScaApproach::Embedded, ScaApproach::Decoupled]).unwrap_err();
        assert_eq!(err, ApproachRegistryError::MissingHandler(ScaApproach::Decoupled));
    }

    #[test]
    fn duplicate_handlers_are_rejected() {
        let handlers = vec![NoopHandler(ScaApproach::Embedded), NoopHandler(ScaApproach::Embedded)];
        let err = ApproachRegistry::new(handlers, &[ScaApproach::Embedded]).unwrap_err();
        assert_eq!(err, ApproachRegistryError::DuplicateHandler(ScaApproach::Embedded));
    }

    #[test]
    fn unknown_approach_is_a_fatal_error() {
        let registry = ApproachRegistry::new(vec![NoopHandler(ScaApproach::Embedded)], &[ScaApproach::Embedded]).unwrap();
        assert!(registry.contains(ScaApproach::Embedded));
        assert!(registry.resolve(ScaApproach::Embedded, ServiceType::Ais).is_ok());
        let err = registry.resolve(ScaApproach::Redirect, ServiceType::Pis).unwrap_err();
        assert_eq!(err.to_string(), "PIS authorisation service was not found for approach REDIRECT");
    }
}
