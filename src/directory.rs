//! Admin SDK Directory API client.

use tracing::debug;

use crate::auth::Scope;
use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{UserListResponse, UserRecord};

/// Lists the users of one domain, acting as the administrator.
#[derive(Clone)]
pub struct DirectoryClient {
    api: ApiClient,
    base_url: String,
    domain: String,
    admin_email: String,
}

impl DirectoryClient {
    pub fn new(api: ApiClient, base_url: &str, domain: &str, admin_email: &str) -> Self {
        Self {
            api,
            base_url: base_url.trim_end_matches('/').to_string(),
            domain: domain.to_string(),
            admin_email: admin_email.to_string(),
        }
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    /// All users in the domain, every page fetched before returning.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let users = self
            .api
            .get_paginated::<UserListResponse>(
                &self.users_url(),
                &self.admin_email,
                Scope::Directory,
                &[
                    ("domain", self.domain.as_str()),
                    ("maxResults", "500"),
                    ("fields", "nextPageToken, users(primaryEmail, name)"),
                ],
            )
            .await?;
        debug!(count = users.len(), "listed domain users");
        Ok(users.into_iter().map(UserRecord::from).collect())
    }

    /// Smallest possible call that proves the API is enabled and delegated.
    pub async fn probe(&self) -> Result<()> {
        let _: UserListResponse = self
            .api
            .get_json(
                &self.users_url(),
                &self.admin_email,
                Scope::Directory,
                &[("domain", self.domain.as_str()), ("maxResults", "1")],
            )
            .await?;
        Ok(())
    }
}
