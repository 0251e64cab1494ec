/// Factory: build the token validator from application `Config`.
use crate::config::Config;
use crate::services::auth::TokenValidator;

pub fn build_token_validator(config: &Config) -> TokenValidator {
    TokenValidator::new(
        config.access_token_secret.as_bytes(),
        config.access_token_leeway_seconds,
        config.access_token_issuer.as_deref(),
        config.access_token_audience.as_deref(),
    )
}
