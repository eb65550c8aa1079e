use crate::{AdminMetrics, ApiClient, ApiError};
use reqwest::Method;

/// Platform-wide statistics. Only administrators may see these.
pub async fn admin_metrics(
    client: &ApiClient,
) -> Result<AdminMetrics, ApiError> {
    let request = client.request(Method::GET, &["admin", "metrics"])?;
    client.send(request).await
}
