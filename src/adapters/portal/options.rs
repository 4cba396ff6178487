//! Implements OptionsPort against the portal: which years exist for a degree,
//! which batches exist for a degree and year.
//!
//! The portal has several half-working endpoints for this. They are tried
//! sequentially in a fixed order and the first non-empty answer wins; no two
//! requests are ever in flight at once.

use crate::adapters::portal::client::PortalClient;
use crate::adapters::portal::normalizer;
use crate::adapters::portal::session::{SessionAcquirer, SessionContext};
use crate::domain::{DomainError, order_batches, order_years};
use crate::ports::OptionsPort;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct OptionsResolver {
    client: Arc<PortalClient>,
    sessions: SessionAcquirer,
}

impl OptionsResolver {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self {
            sessions: SessionAcquirer::new(Arc::clone(&client)),
            client,
        }
    }

    /// One GET candidate. Any failure counts as "nothing here" so the chain can move on.
    async fn try_get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        session: &SessionContext,
    ) -> Option<Value> {
        match self.client.get_json(path, query, session).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(endpoint = path, error = %e, "GET candidate failed");
                None
            }
        }
    }

    async fn try_post(
        &self,
        path: &str,
        form: &[(&str, &str)],
        session: &SessionContext,
    ) -> Option<Value> {
        match self.client.post_form(path, form, session).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(endpoint = path, error = %e, "POST candidate failed");
                None
            }
        }
    }

    async fn year_labels(&self, degree: &str, session: &SessionContext) -> Vec<String> {
        let endpoints = self.client.endpoints();

        // 1. Authenticated GET.
        if let Some(payload) = self
            .try_get(&endpoints.years_by_degree, &[("degree", degree)], session)
            .await
        {
            let records = normalizer::extract(&payload);
            info!(degree, records = records.len(), "GET years");
            if !records.is_empty() {
                return records.into_iter().map(|r| r.year).collect();
            }
        }

        // 2. CSRF-bearing POST fallbacks.
        let form = [("_token", session.token()), ("degree", degree)];
        for path in &endpoints.years_post {
            let Some(payload) = self.try_post(path, &form, session).await else {
                continue;
            };
            let records = normalizer::extract(&payload);
            info!(degree, endpoint = %path, records = records.len(), "POST years");
            if !records.is_empty() {
                return records.into_iter().map(|r| r.year).collect();
            }
        }

        Vec::new()
    }

    async fn batch_labels(&self, degree: &str, year: &str, session: &SessionContext) -> Vec<String> {
        let endpoints = self.client.endpoints();

        // 1. CSRF-bearing POST candidates.
        let form = [
            ("_token", session.token()),
            ("degree", degree),
            ("year", year),
        ];
        for path in &endpoints.batches_post {
            let Some(payload) = self.try_post(path, &form, session).await else {
                continue;
            };
            debug!(endpoint = %path, body = %truncate(&payload), "POST batches response");
            let batches = normalizer::batch_labels(&payload);
            if !batches.is_empty() {
                info!(degree, year, endpoint = %path, batches = batches.len(), "POST batches");
                return batches;
            }
        }

        // 2. GET with degree and year.
        if let Some(payload) = self
            .try_get(
                &endpoints.batches_by_year,
                &[("degree", degree), ("year", year)],
                session,
            )
            .await
        {
            debug!(body = %truncate(&payload), "GET batches response");
            let batches = normalizer::batch_labels(&payload);
            if !batches.is_empty() {
                info!(degree, year, batches = batches.len(), "GET batches");
                return batches;
            }
        }

        // 3. Every record of the degree, filtered locally by year.
        let Some(payload) = self
            .try_get(&endpoints.years_by_degree, &[("degree", degree)], session)
            .await
        else {
            return Vec::new();
        };
        let batches: Vec<String> = normalizer::extract(&payload)
            .into_iter()
            .filter(|r| r.year == year)
            .map(|r| r.batch)
            .collect();
        info!(degree, year, batches = batches.len(), "fallback batches from year list");
        batches
    }
}

fn truncate(value: &Value) -> String {
    value.to_string().chars().take(300).collect()
}

/// Empty strings count as absent, as they do for the form-based portal.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait::async_trait]
impl OptionsPort for OptionsResolver {
    async fn get_years(&self, degree: &str) -> Result<Vec<String>, DomainError> {
        let degree = present(Some(degree)).ok_or(DomainError::MissingParameter("degree"))?;
        let session = self.sessions.acquire().await?;
        info!(degree, csrf = session.csrf_token.is_some(), "resolving years");
        Ok(order_years(self.year_labels(degree, &session).await))
    }

    async fn get_batches(
        &self,
        degree: &str,
        year: Option<&str>,
    ) -> Result<Vec<String>, DomainError> {
        let degree = present(Some(degree)).ok_or(DomainError::MissingParameter("degree"))?;
        let year = present(year).ok_or(DomainError::MissingParameter("year"))?;
        let session = self.sessions.acquire().await?;
        info!(degree, year, csrf = session.csrf_token.is_some(), "resolving batches");
        Ok(order_batches(self.batch_labels(degree, year, &session).await))
    }
}
