use linkhop_core::LinkStats;
use linkhop_shortener::{CreateParams, CreatedLink};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub url: String,
    pub slug: Option<String>,
    /// Seconds; zero or negative values are rejected.
    pub ttl: Option<i64>,
}

impl From<CreateLinkRequest> for CreateParams {
    fn from(request: CreateLinkRequest) -> Self {
        Self {
            url: request.url,
            slug: request.slug,
            ttl: request.ttl,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLinkResponse {
    pub slug: String,
    pub url: String,
}

impl From<CreatedLink> for CreateLinkResponse {
    fn from(link: CreatedLink) -> Self {
        Self {
            slug: link.slug.into_inner(),
            url: link.url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub slug: String,
    pub url: String,
    pub clicks: u64,
    pub last_window: u64,
}

impl From<LinkStats> for StatsResponse {
    fn from(stats: LinkStats) -> Self {
        Self {
            slug: stats.slug.into_inner(),
            url: stats.url,
            clicks: stats.total_clicks,
            last_window: stats.clicks_in_window,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
