use crate::{
    error_holder::{ErrorHolder, ErrorType, MessageErrorCode, TppMessageInformation},
    spi::SpiResponse,
    xs2a_types::ServiceType,
};

/// Translates SPI error envelopes into TPP-facing [`ErrorHolder`]s.
///
/// The HTTP class of the holder comes from the first message the backend reported. A response flagged as failed
/// without any messages maps to `<service>_500` / `INTERNAL_SERVER_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpiErrorMapper;

impl SpiErrorMapper {
    pub fn map_to_error_holder<T>(response: &SpiResponse<T>, service_type: ServiceType) -> ErrorHolder {
        Self::map_messages(response.errors(), service_type)
    }

    pub fn map_messages(messages: &[TppMessageInformation], service_type: ServiceType) -> ErrorHolder {
        match messages.first() {
            Some(first) => {
                let error_type = ErrorType::new(service_type, first.message_error_code.http_code());
                ErrorHolder::new(error_type, messages.iter().cloned())
            },
            None => ErrorHolder::single(ErrorType::new(service_type, 500), MessageErrorCode::InternalServerError),
        }
    }
}
