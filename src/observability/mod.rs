//! Logging helpers.

pub mod telemetry;

/// Mask a Bearer token or secret for log output.
pub fn mask_secret(value: &str) -> String {
    if let Some(token) = value.strip_prefix("Bearer ") {
        return format!("Bearer {}", mask_secret(token));
    }
    if value.len() > 12 && value.is_ascii() {
        format!("{}...{}", &value[..4], &value[value.len() - 4..])
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_tokens() {
        assert_eq!(mask_secret("ya29.abcdefghijkl"), "ya29...ijkl");
        assert_eq!(mask_secret("Bearer short"), "Bearer ***");
    }
}
