use crate::api::{Envelope, finalize, settle};
use crate::config::Config;
use crate::endpoint::{ApiEndpoint, Endpoint};
use crate::error::{Error, Result};
use crate::model::Response;
use log::{info, warn};
use reqwest::blocking::{Client as Http, RequestBuilder};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// Credentials of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthedState {
    pub api_token: String,
    pub username: String,
}

impl AuthedState {
    fn handle(&self, req: RequestBuilder) -> RequestBuilder {
        req.query(&[("auth_token", &self.api_token)])
    }
}

#[derive(Debug, Deserialize)]
struct WhoAmI {
    username: String,
    #[serde(default)]
    api_token: Option<String>,
}

/// Blocking client for the Desktoppr API.
///
/// Reads work without credentials. Mutating calls need a session set up by
/// [`Client::authorize_token`] or [`Client::authorize_user_pass`]; the
/// session belongs to this instance only.
#[derive(Debug, Clone)]
pub struct Client {
    http: Http,
    pub(crate) api: ApiEndpoint,
    state: Option<AuthedState>,
}

impl Client {
    pub fn new() -> Result<Self> {
        Self::with_config(&Config::default())
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::with_config(&Config::with_base_url(base_url))
    }

    pub fn with_config(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let mut builder = Http::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            http: builder.build()?,
            api: ApiEndpoint::with_base(&config.base_url)?,
            state: None,
        })
    }

    /// Restores a session saved from [`Client::state`] without a round trip.
    pub fn load(mut self, state: AuthedState) -> Self {
        self.state = Some(state);
        self
    }

    pub(crate) fn guest_call(&self, endpoint: &impl Endpoint) -> RequestBuilder {
        endpoint.request(&self.http)
    }

    pub(crate) fn call(&self, endpoint: &impl Endpoint) -> Result<RequestBuilder> {
        match &self.state {
            Some(state) => Ok(state.handle(self.guest_call(endpoint))),
            None => Err(Error::Unauthed),
        }
    }

    fn raw_auth_token(&self, api_token: &str) -> Result<AuthedState> {
        let req = self
            .guest_call(&self.api.whoami())
            .query(&[("auth_token", api_token)]);
        let who: Envelope<WhoAmI> = finalize(req)?;
        Ok(AuthedState {
            api_token: api_token.to_owned(),
            username: who.response.username,
        })
    }

    fn raw_auth_user_pass(&self, username: &str, password: &str) -> Result<AuthedState> {
        let req = self
            .guest_call(&self.api.whoami())
            .basic_auth(username, Some(password));
        let who: Envelope<WhoAmI> = finalize(req)?;
        let api_token = who
            .response
            .api_token
            .ok_or_else(|| Error::Desktoppr(200, "whoami carried no api_token".into()))?;
        Ok(AuthedState {
            api_token,
            username: who.response.username,
        })
    }

    fn settle_auth(&mut self, res: Result<AuthedState>) -> bool {
        match res {
            Ok(state) => {
                info!("authenticated as {}", state.username);
                self.state = Some(state);
                true
            }
            Err(e) => {
                warn!("authorization failed: {e}");
                false
            }
        }
    }

    /// Authorizes with a pre-issued API token. On failure the previous
    /// session, if any, is kept.
    pub fn authorize_token(&mut self, api_token: &str) -> bool {
        let res = self.raw_auth_token(api_token);
        self.settle_auth(res)
    }

    /// Exchanges a username and password for the account's API token.
    pub fn authorize_user_pass(&mut self, username: &str, password: &str) -> bool {
        let res = self.raw_auth_user_pass(username, password);
        self.settle_auth(res)
    }

    pub fn logout(&mut self) -> Option<AuthedState> {
        self.state.take()
    }

    pub fn state(&self) -> Option<&AuthedState> {
        self.state.as_ref()
    }

    pub fn is_authed(&self) -> bool {
        self.state.is_some()
    }

    pub fn api_token(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.api_token.as_str())
    }

    pub fn authed_user(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.username.as_str())
    }

    /// The authenticated account as the server describes it.
    pub fn whoami(&self) -> Option<Response> {
        let res = self
            .call(&self.api.whoami())
            .and_then(finalize::<Envelope<Response>>);
        settle("whoami", res).map(|r| r.response)
    }
}
