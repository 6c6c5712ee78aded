//! Enrichment orchestration: one display name in, a full demographic
//! profile out.
//!
//! Three classifiers are asked independently (age, gender, nationality) and
//! the whole operation fails if any one of them cannot produce a parseable
//! answer. The lookups share no state, so they run on three worker threads;
//! all three are joined before the verdict, so a fast failure never leaves
//! a lookup still in flight.

use std::thread;
use std::time::Duration;

use crate::{
    AgeResponse, ApiError, EnrichedProfile, GenderResponse, NationalityResponse, ServiceConfig,
};

#[derive(Clone)]
pub(crate) struct Enricher {
    agent: ureq::Agent,
    age_url: String,
    gender_url: String,
    nationality_url: String,
}

impl Enricher {
    pub(crate) fn new(config: &ServiceConfig) -> Self {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Enricher {
            agent,
            age_url: config.age_url.trim_end_matches('/').to_string(),
            gender_url: config.gender_url.trim_end_matches('/').to_string(),
            nationality_url: config.nationality_url.trim_end_matches('/').to_string(),
        }
    }

    fn call(
        &self,
        service: &'static str,
        base: &str,
        name: &str,
    ) -> Result<ureq::Response, ApiError> {
        let url = format!("{base}/?name={}", urlencoding::encode(name));
        match self.agent.get(&url).call() {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(code, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(ApiError::upstream(service, format!("status {code}: {text}")))
            }
            Err(ureq::Error::Transport(err)) => Err(ApiError::upstream(service, err.to_string())),
        }
    }

    pub(crate) fn lookup_age(&self, name: &str) -> Result<i64, ApiError> {
        let parsed: AgeResponse = self
            .call("age", &self.age_url, name)?
            .into_json()
            .map_err(|e| ApiError::upstream("age", format!("bad body: {e}")))?;
        // null, absent, or negative all mean the service has no data
        Ok(parsed.age.unwrap_or(0).max(0))
    }

    pub(crate) fn lookup_gender(&self, name: &str) -> Result<String, ApiError> {
        let parsed: GenderResponse = self
            .call("gender", &self.gender_url, name)?
            .into_json()
            .map_err(|e| ApiError::upstream("gender", format!("bad body: {e}")))?;
        Ok(parsed.gender.unwrap_or_default())
    }

    pub(crate) fn lookup_nationality(&self, name: &str) -> Result<String, ApiError> {
        let parsed: NationalityResponse = self
            .call("nationality", &self.nationality_url, name)?
            .into_json()
            .map_err(|e| ApiError::upstream("nationality", format!("bad body: {e}")))?;
        // Candidates arrive ordered by descending confidence; take the head.
        Ok(parsed
            .country
            .into_iter()
            .next()
            .map(|candidate| candidate.country_id)
            .unwrap_or_default())
    }

    /// Run all three lookups for `name` and assemble the profile.
    /// All-or-nothing: a single failed lookup fails the whole call, and no
    /// partial profile escapes.
    pub(crate) fn enrich(&self, name: &str) -> Result<EnrichedProfile, ApiError> {
        let age_task = {
            let worker = self.clone();
            let name = name.to_string();
            thread::spawn(move || worker.lookup_age(&name))
        };
        let gender_task = {
            let worker = self.clone();
            let name = name.to_string();
            thread::spawn(move || worker.lookup_gender(&name))
        };
        let nationality_task = {
            let worker = self.clone();
            let name = name.to_string();
            thread::spawn(move || worker.lookup_nationality(&name))
        };

        let age = join_lookup(age_task, "age");
        let gender = join_lookup(gender_task, "gender");
        let nationality = join_lookup(nationality_task, "nationality");

        Ok(EnrichedProfile {
            age: age?,
            gender: gender?,
            nationality: nationality?,
        })
    }
}

fn join_lookup<T>(
    task: thread::JoinHandle<Result<T, ApiError>>,
    service: &'static str,
) -> Result<T, ApiError> {
    task.join()
        .unwrap_or_else(|_| Err(ApiError::upstream(service, "lookup worker panicked")))
}

// ── Test support ─────────────────────────────────────────────────────────


// ── Tests ────────────────────────────────────────────────────────────────
