// src/chaos/session.rs
use super::ChaosError;
use crate::api::{Application, ApplicationApi};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Bearer token obtained once at startup. Cloning shares the same
/// allocation; nothing ever writes to it afterwards.
#[derive(Clone)]
pub struct Session {
    token: Arc<str>,
}

impl Session {
    pub async fn establish(
        api: &dyn ApplicationApi,
        username: &str,
        password: &str,
    ) -> Result<Self, ChaosError> {
        let token = api.get_token(username, password).await?;
        info!("Authenticated as {}", username);
        Ok(Self::from_token(token))
    }

    pub fn from_token(token: impl Into<Arc<str>>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// Applications visible to the session, fetched once and never refreshed.
#[derive(Debug, Clone)]
pub struct Inventory {
    applications: Vec<Application>,
}

impl Inventory {
    pub async fn fetch(api: &dyn ApplicationApi, session: &Session) -> Result<Self, ChaosError> {
        let applications = api.list_applications(session.token()).await?;
        info!("Found {} applications", applications.len());
        Ok(Self { applications })
    }

    pub fn new(applications: Vec<Application>) -> Self {
        Self { applications }
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    /// The leading `threads` applications, in inventory order.
    pub fn select(&self, threads: usize) -> Result<&[Application], ChaosError> {
        if threads == 0 {
            return Err(ChaosError::InvalidThreads);
        }
        self.applications
            .get(..threads)
            .ok_or(ChaosError::NotEnoughApplications {
                requested: threads,
                available: self.applications.len(),
            })
    }
}
