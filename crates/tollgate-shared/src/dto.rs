//! Data Transfer Objects - response bodies of the API.

use serde::{Deserialize, Serialize};

/// Body of a 429 rejection: problem details plus quota diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitExceededResponse {
    #[serde(flatten)]
    pub problem: crate::ErrorResponse,
    /// Seconds until the current window resets, rounded up.
    pub retry_after: u64,
    /// Requests allowed per interval for the tenant's tier.
    pub limit: u32,
    pub tier: String,
}

impl RateLimitExceededResponse {
    pub fn new(retry_after: u64, limit: u32, tier: impl Into<String>) -> Self {
        let tier = tier.into();
        let problem = crate::ErrorResponse::too_many_requests(format!(
            "Rate limit of {limit} requests exceeded for the {tier} plan. Try again in {retry_after} seconds."
        ));

        Self {
            problem,
            retry_after,
            limit,
            tier,
        }
    }
}

/// The calling tenant's plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub tenant_id: String,
    pub tier: String,
    /// Requests per interval, or `"unlimited"`.
    pub limit: String,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_body_shape() {
        let body = RateLimitExceededResponse::new(42, 60, "STARTER");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["status"], 429);
        assert_eq!(json["title"], "Too Many Requests");
        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["retry_after"], 42);
        assert_eq!(json["limit"], 60);
        assert_eq!(json["tier"], "STARTER");
        assert!(json["detail"].as_str().unwrap().contains("42 seconds"));
        assert!(json.get("request_id").is_none());
    }
}
