/*!
 * Client for the external chrF scoring service.
 *
 * Scoring is advisory: any transport or schema problem maps to the sentinel
 * score `-1.0` so a dead scorer never fails a row.
 */

use std::time::Duration;

use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Sentinel written when the scorer is unreachable or answers garbage
pub const SCORE_UNAVAILABLE: f64 = -1.0;

/// Scoring request payload
#[derive(Debug, Serialize)]
struct ScoreRequest {
    /// Candidate translations, one per row scored
    candidates: Vec<String>,
    /// Reference translations, one list per candidate
    references: Vec<Vec<String>>,
}

/// Scoring response payload
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    /// Character n-gram F-score of candidates against references
    chrf_score: f64,
}

/// Client for a chrF scoring endpoint
pub struct ChrfClient {
    endpoint: String,
    client: Client,
}

impl ChrfClient {
    /// Create a new scoring client
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Score one candidate against one reference.
    ///
    /// Returns [`SCORE_UNAVAILABLE`] on any failure rather than an error.
    pub async fn score(&self, candidate: &str, reference: &str) -> f64 {
        let request = ScoreRequest {
            candidates: vec![candidate.to_string()],
            references: vec![vec![reference.to_string()]],
        };

        let response = match self.client.post(&self.endpoint).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("chrF scoring request failed: {}", e);
                return SCORE_UNAVAILABLE;
            }
        };

        if !response.status().is_success() {
            warn!("chrF scoring endpoint returned {}", response.status());
            return SCORE_UNAVAILABLE;
        }

        match response.json::<ScoreResponse>().await {
            Ok(parsed) => parsed.chrf_score,
            Err(e) => {
                warn!("Failed to parse chrF scoring response: {}", e);
                SCORE_UNAVAILABLE
            }
        }
    }
}
