use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid override '{0}'. Expected KEY=VALUE (e.g., 'k=0.5').")]
    MissingSeparator(String),

    #[error("Override '{0}' has an empty key.")]
    EmptyKey(String),
}

/// Splits `KEY=VALUE` at the first `=`. The value may itself contain `=` and may be empty.
pub fn parse_key_value(pair: &str) -> Result<(String, String), ParseError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
