//! Authenticated HTTP plumbing shared by the Directory, Drive and Sheets clients.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::{Authenticator, Scope};
use crate::error::{AuditError, Result};
use crate::models::{
    ApiErrorResponse, DirectoryUser, DriveListResponse, FileListResponse, FileRecord,
    SharedDriveRecord, UserListResponse,
};

/// A list response that may continue on another page.
pub trait Paginated: DeserializeOwned {
    type Item;

    fn into_page(self) -> (Vec<Self::Item>, Option<String>);
}

impl Paginated for FileListResponse {
    type Item = FileRecord;

    fn into_page(self) -> (Vec<FileRecord>, Option<String>) {
        (self.files, self.next_page_token)
    }
}

impl Paginated for DriveListResponse {
    type Item = SharedDriveRecord;

    fn into_page(self) -> (Vec<SharedDriveRecord>, Option<String>) {
        (self.drives, self.next_page_token)
    }
}

impl Paginated for UserListResponse {
    type Item = DirectoryUser;

    fn into_page(self) -> (Vec<DirectoryUser>, Option<String>) {
        (self.users, self.next_page_token)
    }
}

/// HTTP client that attaches delegated bearer tokens to every request.
#[derive(Clone)]
pub struct ApiClient {
    auth: Authenticator,
    http: Client,
}

impl ApiClient {
    pub fn new(auth: Authenticator) -> Self {
        Self {
            auth,
            http: Client::new(),
        }
    }

    /// GET a JSON resource as `subject`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        subject: &str,
        scope: Scope,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.auth.access_token(subject, scope).await?;
        debug!(url, subject, ?query, "GET");
        let response = self.http.get(url).bearer_auth(&token).query(query).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body as `subject` and decode the JSON reply.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        subject: &str,
        scope: Scope,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T> {
        let token = self.auth.access_token(subject, scope).await?;
        debug!(url, subject, "POST");
        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .query(query)
            .json(body)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// DELETE a resource as `subject`.
    pub async fn delete(
        &self,
        url: &str,
        subject: &str,
        scope: Scope,
        query: &[(&str, &str)],
    ) -> Result<()> {
        let token = self.auth.access_token(subject, scope).await?;
        debug!(url, subject, "DELETE");
        let response = self
            .http
            .delete(url)
            .bearer_auth(&token)
            .query(query)
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    /// GET every page of a list endpoint, following `nextPageToken`.
    pub async fn get_paginated<R: Paginated>(
        &self,
        url: &str,
        subject: &str,
        scope: Scope,
        query: &[(&str, &str)],
    ) -> Result<Vec<R::Item>> {
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = self.auth.access_token(subject, scope).await?;
            let mut request: RequestBuilder =
                self.http.get(url).bearer_auth(&token).query(query);

            if let Some(ref page) = page_token {
                debug!(url, "fetching another page");
                request = request.query(&[("pageToken", page)]);
            } else {
                debug!(url, subject, ?query, "GET (paginated)");
            }

            let response = check_response(request.send().await?).await?;
            let page: R = response.json().await?;
            let (items, next) = page.into_page();
            all_items.extend(items);

            match next {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all_items)
    }
}

/// Turn a non-success response into `AuditError::Api`, preferring the
/// message from Google's JSON error envelope.
pub async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(AuditError::Api {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }
    Err(AuditError::Api {
        status: status.as_u16(),
        message: error_body,
    })
}
