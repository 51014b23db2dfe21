//! Vertex AI Utilities
//!
//! URL construction for publisher model endpoints.

/// Build a Vertex AI base URL given project, location and publisher.
///
/// Regional locations use `https://{location}-aiplatform.googleapis.com`;
/// `global` uses the global host.
///
/// # Example
///
/// ```rust,ignore
/// use vertex_imagen::utils::vertex_base_url;
///
/// let url = vertex_base_url("my-project", "us-central1", "google");
/// assert_eq!(
///     url,
///     "https://us-central1-aiplatform.googleapis.com/v1/projects/my-project/locations/us-central1/publishers/google"
/// );
/// ```
pub fn vertex_base_url(project: &str, location: &str, publisher: &str) -> String {
    let host = if location == "global" {
        "aiplatform.googleapis.com".to_string()
    } else {
        format!("{location}-aiplatform.googleapis.com")
    };
    format!("https://{host}/v1/projects/{project}/locations/{location}/publishers/{publisher}")
}

/// Strip resource-name prefixes from a model id.
///
/// Accepts `imagen-3.0-generate-002`, `models/imagen-3.0-generate-002` and
/// full `publishers/google/models/...` resource names.
pub fn normalize_model_id(model: &str) -> String {
    let trimmed = model.trim().trim_matches('/');
    if let Some(pos) = trimmed.rfind("/models/") {
        return trimmed[(pos + "/models/".len())..].to_string();
    }
    if let Some(rest) = trimmed.strip_prefix("models/") {
        return rest.to_string();
    }
    trimmed.to_string()
}

/// `:predict` endpoint for a model under `base_url`.
pub fn predict_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:predict",
        base_url.trim_end_matches('/'),
        normalize_model_id(model)
    )
}
