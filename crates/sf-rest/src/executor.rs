//! Session-aware request execution.
//!
//! Every call runs with the selected profile's credentials. When the server
//! reports an expired session the executor re-authenticates once and
//! retries; a second rejection is returned as an authentication error.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use playforce_sf_auth::{Authenticator, Credentials};
use playforce_sf_client::security::soql;
use playforce_sf_client::{
    ClientConfig, QueryResult, RequestMethod, SalesforceClient, SfHttpClient,
};
use playforce_sf_license::LicenseGate;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::describe::{DescribeGlobalResult, DescribeSObjectResult, FieldSummary};
use crate::error::{Error, ErrorKind, Result};

/// Runs Salesforce calls for the selected profile.
#[derive(Debug)]
pub struct RequestExecutor {
    auth: Arc<Authenticator>,
    license: LicenseGate,
    http: SfHttpClient,
}

impl RequestExecutor {
    /// Create an executor sharing one connection pool across sessions.
    pub fn new(auth: Arc<Authenticator>, license: LicenseGate, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            auth,
            license,
            http: SfHttpClient::new(config)?,
        })
    }

    pub fn authenticator(&self) -> &Arc<Authenticator> {
        &self.auth
    }

    pub fn license(&self) -> &LicenseGate {
        &self.license
    }

    async fn client(&self, force_refresh: bool) -> Result<SalesforceClient> {
        let creds = self.auth.credentials(force_refresh).await?;
        Ok(
            SalesforceClient::from_http(self.http.clone(), creds.instance_url(), creds.access_token())
                .with_api_version(creds.api_version()),
        )
    }

    /// Run `op` with an authenticated client, re-authenticating and
    /// retrying exactly once if the session has expired.
    pub async fn with_session<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(SalesforceClient) -> Fut,
        Fut: Future<Output = playforce_sf_client::Result<T>>,
    {
        let client = self.client(false).await?;
        match op(client).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_session_expired() => {
                warn!("Session expired, re-authenticating");
                let client = self.client(true).await?;
                op(client).await.map_err(|e| {
                    if e.is_session_expired() {
                        session_rejected(e)
                    } else {
                        e.into()
                    }
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// First page of a SOQL query.
    #[instrument(skip(self))]
    pub async fn query(&self, soql: &str) -> Result<QueryResult<Value>> {
        self.with_session(|client| async move { client.query(soql).await })
            .await
            .map_err(Error::into_soql)
    }

    /// The page addressed by a `nextRecordsUrl`.
    #[instrument(skip(self))]
    pub async fn query_more(&self, next_records_url: &str) -> Result<QueryResult<Value>> {
        self.with_session(|client| async move { client.query_more(next_records_url).await })
            .await
            .map_err(Error::into_soql)
    }

    /// Call the sObjects REST API at `path` (relative to `…/sobjects/`).
    ///
    /// Anything other than GET requires a valid license, checked before any
    /// network traffic. `204 No Content` yields `Value::Null`.
    #[instrument(skip(self, body), fields(method = %method))]
    pub async fn execute_rest(
        &self,
        method: RequestMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        validate_rest_path(path)?;

        if !method.is_read_only() {
            let check = self.license.check();
            if !check.licensed {
                warn!(method = %method, "Write blocked by license gate");
                return Err(Error::new(ErrorKind::License(check.message)));
            }
            debug!("License verified for write");
        }

        let requested_url = Mutex::new(String::new());
        let result = self
            .with_session(|client| {
                let url = client.sobjects_url(path);
                *requested_url.lock().unwrap_or_else(PoisonError::into_inner) = url.clone();
                async move { client.send_json(method, &url, body).await }
            })
            .await;

        result.map_err(|e| {
            let url = requested_url.into_inner().unwrap_or_else(PoisonError::into_inner);
            e.into_rest(&url)
        })
    }

    /// All sObjects visible to the user.
    #[instrument(skip(self))]
    pub async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        let value = self.execute_rest(RequestMethod::Get, "", None).await?;
        decode(value)
    }

    /// Full describe of one sObject.
    #[instrument(skip(self))]
    pub async fn describe_object(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        if !soql::is_safe_sobject_name(sobject) {
            return Err(Error::new(ErrorKind::InvalidInput(format!(
                "invalid sObject name: {sobject}"
            ))));
        }
        let value = self
            .execute_rest(RequestMethod::Get, &format!("{sobject}/describe"), None)
            .await?;
        decode(value)
    }

    /// Field summaries of one sObject.
    pub async fn object_fields(&self, sobject: &str) -> Result<Vec<FieldSummary>> {
        let describe = self.describe_object(sobject).await?;
        Ok(describe.fields.iter().map(FieldSummary::from).collect())
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::with_source(
            ErrorKind::Client {
                status: None,
                message: format!("unexpected describe payload: {e}"),
            },
            e,
        )
    })
}

fn session_rejected(err: playforce_sf_client::Error) -> Error {
    let status = err.status().unwrap_or(401);
    let body = err
        .provider_body()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    Error::with_source(
        ErrorKind::Auth(playforce_sf_auth::ErrorKind::Auth { status, body }),
        err,
    )
}

fn validate_rest_path(path: &str) -> Result<()> {
    let invalid = path.contains("://")
        || path.split(['/', '?']).any(|segment| segment == "..")
        || path.chars().any(char::is_whitespace);
    if invalid {
        return Err(Error::new(ErrorKind::InvalidInput(format!(
            "invalid sObjects path: {path}"
        ))));
    }
    Ok(())
}
