mod link;

pub use link::{CreateLinkRequest, CreateLinkResponse, ErrorResponse, HealthResponse, StatsResponse};
