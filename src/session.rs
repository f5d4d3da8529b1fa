//! The session facade.
//!
//! [`Session`] owns every piece of per-process state: the profile pointer,
//! the token cache, the running queries and the OAuth callback listener.
//! A desktop shell creates one at startup and calls into it for each user
//! action.

use std::sync::Arc;

use futures::stream::BoxStream;
use playforce_sf_auth::{AuthAttempt, Authenticator, CallbackListener, CallbackOutcome, Profile};
use playforce_sf_client::RequestMethod;
use playforce_sf_license::{LicenseCheck, LicenseGate};
use playforce_sf_rest::{
    DescribeGlobalResult, DescribeSObjectResult, FieldSummary, QueryEngine, QueryEvent,
    QueryOutcome, QueryProgress, RequestExecutor,
};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, OnceCell};
use tracing::{info, instrument};

use crate::config::SessionConfig;
use crate::error::{Error, ErrorKind, Result};

/// An interactive authorization in progress.
///
/// Open [`authorization_url`](Self::authorization_url) in a browser, then
/// hand the flow to [`Session::complete_oauth_flow`].
#[derive(Debug)]
pub struct OAuthFlow {
    pub authorization_url: String,
    pub redirect_uri: String,
    callback: oneshot::Receiver<CallbackOutcome>,
}

/// Salesforce session for one desktop process.
pub struct Session {
    config: SessionConfig,
    auth: Arc<Authenticator>,
    license: LicenseGate,
    engine: QueryEngine,
    listener: OnceCell<CallbackListener>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config_dir", &self.config.config_dir)
            .field("license", &self.license)
            .field("profile", &self.auth.current_profile_name())
            .field("callback_port", &self.callback_port())
            .finish()
    }
}

impl Session {
    /// Set up a session. Nothing is read from disk or the network until a
    /// profile is selected.
    pub fn create(config: SessionConfig) -> Result<Self> {
        let auth = Arc::new(Authenticator::with_client_config(
            &config.config_dir,
            &config.client,
        )?);
        let license = match &config.license_public_key {
            Some(pem) => LicenseGate::with_public_key_pem(&config.license_file, pem)?,
            None => LicenseGate::new(&config.license_file)?,
        };
        let executor = RequestExecutor::new(auth.clone(), license.clone(), config.client.clone())?;

        info!(config_dir = %config.config_dir.display(), "Session created");
        Ok(Self {
            config,
            auth,
            license,
            engine: QueryEngine::new(Arc::new(executor)),
            listener: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // Profiles

    /// Select the profile named `name`. False if it does not exist.
    pub fn select_config(&self, name: &str) -> bool {
        self.auth.select_profile(name)
    }

    pub fn list_configs(&self) -> Vec<String> {
        self.auth.list_profiles()
    }

    /// The selected profile. Secrets are redacted when it is serialized.
    pub fn current_config(&self) -> Option<Profile> {
        self.auth.current_profile()
    }

    // Authentication

    pub fn requires_oauth(&self) -> bool {
        self.auth.requires_oauth()
    }

    pub async fn try_authenticate(&self) -> AuthAttempt {
        self.auth.try_authenticate().await
    }

    pub fn has_valid_token(&self) -> bool {
        self.auth.has_valid_token()
    }

    /// Port of the callback listener, once a flow has been started.
    pub fn callback_port(&self) -> Option<u16> {
        self.listener.get().map(CallbackListener::port)
    }

    async fn listener(&self) -> Result<&CallbackListener> {
        let listener = self
            .listener
            .get_or_try_init(|| CallbackListener::bind(self.config.callback_ports.clone()))
            .await?;
        Ok(listener)
    }

    /// Begin the authorization-code flow for the selected profile.
    ///
    /// The callback listener is bound on the first call and reused after.
    /// Starting a new flow abandons any flow still waiting.
    #[instrument(skip(self))]
    pub async fn start_oauth_flow(&self) -> Result<OAuthFlow> {
        let listener = self.listener().await?;
        let redirect_uri = listener.redirect_uri();
        let authorization_url = self.auth.authorization_url(&redirect_uri)?;
        let callback = listener.next_callback();
        info!(port = listener.port(), "OAuth flow started");
        Ok(OAuthFlow {
            authorization_url,
            redirect_uri,
            callback,
        })
    }

    /// Wait for the browser callback of `flow` and exchange its code.
    #[instrument(skip(self, flow))]
    pub async fn complete_oauth_flow(&self, flow: OAuthFlow) -> Result<()> {
        let outcome = flow.callback.await.map_err(|_| {
            Error::new(ErrorKind::OAuthFlow(
                "the callback was superseded or the listener stopped".to_string(),
            ))
        })?;
        let code = outcome.into_code()?;
        self.auth
            .authenticate_with_auth_code(&code, &flow.redirect_uri)
            .await?;
        Ok(())
    }

    /// Exchange an authorization code obtained out of band. The redirect
    /// URI must be the one of the running listener.
    #[instrument(skip(self, code))]
    pub async fn exchange_auth_code(&self, code: &str) -> Result<()> {
        let Some(listener) = self.listener.get() else {
            return Err(Error::new(ErrorKind::OAuthFlow(
                "no OAuth flow has been started".to_string(),
            )));
        };
        self.auth
            .authenticate_with_auth_code(code, &listener.redirect_uri())
            .await?;
        Ok(())
    }

    // Queries

    /// Run `soql` to completion under a generated id.
    pub async fn execute_soql(&self, soql: &str) -> Result<QueryOutcome> {
        Ok(self.engine.execute_soql(soql).await?)
    }

    /// Run `soql` as `query_id`, forwarding progress to `progress`. The
    /// query can be aborted with [`Self::abort_query`] while it runs.
    pub async fn execute_tracked(
        &self,
        query_id: &str,
        soql: &str,
        progress: Option<mpsc::UnboundedSender<QueryProgress>>,
    ) -> Result<QueryOutcome> {
        Ok(self.engine.execute_tracked(query_id, soql, progress).await?)
    }

    /// Events of `soql` run as `query_id`.
    pub fn query_stream(
        &self,
        query_id: impl Into<String>,
        soql: impl Into<String>,
    ) -> BoxStream<'static, playforce_sf_rest::Result<QueryEvent>> {
        self.engine.stream(query_id, soql)
    }

    pub fn abort_query(&self, query_id: &str) -> bool {
        self.engine.abort(query_id)
    }

    pub fn query_progress(&self, query_id: &str) -> Option<QueryProgress> {
        self.engine.progress(query_id)
    }

    pub fn running_queries(&self) -> Vec<String> {
        self.engine.running()
    }

    // REST

    /// sObjects REST call. Writes require a valid license.
    pub async fn execute_rest(
        &self,
        method: RequestMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        Ok(self.engine.executor().execute_rest(method, path, body).await?)
    }

    pub async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        Ok(self.engine.executor().describe_global().await?)
    }

    pub async fn describe_object(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        Ok(self.engine.executor().describe_object(sobject).await?)
    }

    pub async fn object_fields(&self, sobject: &str) -> Result<Vec<FieldSummary>> {
        Ok(self.engine.executor().object_fields(sobject).await?)
    }

    // License

    pub fn license_info(&self) -> LicenseCheck {
        self.license.check()
    }

    /// Abort running queries and stop the callback listener.
    pub fn shutdown(&self) {
        self.engine.abort_all();
        if let Some(listener) = self.listener.get() {
            listener.shutdown();
        }
        info!("Session shut down");
    }
}
