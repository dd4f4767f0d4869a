use domain_types::errors::GatewayError;
use error_stack::Report;

pub fn missing_field_err(
    message: &'static str,
) -> Box<dyn Fn() -> Report<GatewayError> + 'static> {
    Box::new(move || {
        GatewayError::MissingRequiredField {
            field_name: message,
        }
        .into()
    })
}
