use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use google_sheets4::hyper::client::connect::Connection;
use google_sheets4::hyper::service::Service;
use google_sheets4::hyper::Uri;
use google_sheets4::{hyper, hyper_rustls, Sheets};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, info};
use yup_oauth2::{
    authenticator::Authenticator, authenticator_delegate::InstalledFlowDelegate,
    ApplicationSecret, InstalledFlowAuthenticator, InstalledFlowReturnMethod,
};

use crate::cfg::Cfg;
use crate::sheets::SheetsHub;
use crate::token_cache::TokenCache;

// Changing this scope requires deleting the cached token.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFlow {
    /// Print the authorization URL and read the code from the terminal
    #[default]
    Interactive,
    /// Receive the authorization code on a local loopback listener
    Redirect,
}

impl From<AuthFlow> for InstalledFlowReturnMethod {
    fn from(flow: AuthFlow) -> Self {
        match flow {
            AuthFlow::Interactive => InstalledFlowReturnMethod::Interactive,
            AuthFlow::Redirect => InstalledFlowReturnMethod::HTTPRedirect,
        }
    }
}

pub fn read_client_secret(path: impl AsRef<Path>) -> Result<ApplicationSecret> {
    let path = path.as_ref();
    debug!("Reading client secret from: {}", path.display());

    let bytes = std::fs::read(path)
        .with_context(|| format!("Unable to read client secret file {}", path.display()))?;
    yup_oauth2::parse_application_secret(bytes)
        .with_context(|| format!("Unable to parse client secret file {} to config", path.display()))
}

/// Redirect URI sent with the authorization request.
///
/// An explicit setting wins. The interactive flow otherwise uses the first
/// redirect URI registered in the client secret, since Google no longer
/// accepts the out-of-band URI. The redirect flow lets the library use its
/// own loopback address.
pub fn prompt_redirect_uri(
    flow: AuthFlow,
    configured: Option<&str>,
    secret: &ApplicationSecret,
) -> Option<String> {
    if let Some(uri) = configured {
        return Some(uri.to_string());
    }
    match flow {
        AuthFlow::Interactive => secret.redirect_uris.first().cloned(),
        AuthFlow::Redirect => None,
    }
}

/// Terminal prompt shown when no usable token is cached.
pub struct ConsolePrompt {
    redirect_uri: Option<String>,
}

impl ConsolePrompt {
    pub fn new(redirect_uri: Option<String>) -> Self {
        Self { redirect_uri }
    }
}

impl InstalledFlowDelegate for ConsolePrompt {
    fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
        need_code: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
        Box::pin(async move {
            if need_code {
                println!(
                    "Go to the following link in your browser then type the authorization code: \n{}",
                    url
                );
                read_code(BufReader::new(tokio::io::stdin())).await
            } else {
                println!(
                    "Go to the following link in your browser to authorize access: \n{}",
                    url
                );
                Ok(String::new())
            }
        })
    }
}

/// Reads one line and returns its first whitespace-separated word.
pub async fn read_code<R: AsyncBufRead + Unpin>(mut reader: R) -> Result<String, String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .await
        .map_err(|e| format!("Unable to read authorization code: {}", e))?;

    match line.split_whitespace().next() {
        Some(code) => Ok(code.to_string()),
        None => Err("Unable to read authorization code: no code entered".to_string()),
    }
}

pub fn https_client(
) -> Result<hyper::Client<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>> {
    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("Unable to load native root certificates")?
        .https_or_http()
        .enable_http1()
        .build();
    Ok(hyper::Client::builder().build::<_, hyper::Body>(https))
}

pub async fn authenticator<S>(
    secret: ApplicationSecret,
    flow: AuthFlow,
    cache: TokenCache,
    client: hyper::Client<S>,
    prompt: Box<dyn InstalledFlowDelegate>,
) -> Result<Authenticator<S>>
where
    S: Service<Uri> + Clone + Send + Sync + 'static,
    S::Response: Connection + AsyncRead + AsyncWrite + Send + Unpin + 'static,
    S::Future: Send + Unpin + 'static,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    debug!("Using token cache at {}", cache.path().display());
    InstalledFlowAuthenticator::builder(secret, flow.into())
        .with_storage(Box::new(cache))
        .flow_delegate(prompt)
        .hyper_client(client)
        .build()
        .await
        .context("Unable to build OAuth authenticator")
}

/// Resolves a token now, running the authorization flow if the cache has none.
pub async fn fetch_token<S>(auth: &Authenticator<S>) -> Result<String>
where
    S: Service<Uri> + Clone + Send + Sync + 'static,
    S::Response: Connection + AsyncRead + AsyncWrite + Send + Unpin + 'static,
    S::Future: Send + Unpin + 'static,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let token = auth
        .token(&[SPREADSHEETS_SCOPE])
        .await
        .map_err(|e| anyhow!("Unable to retrieve token from web: {}", e))?;

    token
        .token()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Authorization server returned no access token"))
}

pub async fn create_sheets_hub(cfg: &Cfg) -> Result<SheetsHub> {
    info!("Initializing Google Sheets authentication");

    let secret = read_client_secret(&cfg.credentials_path)?;
    let redirect_uri = prompt_redirect_uri(cfg.auth_flow, cfg.redirect_uri.as_deref(), &secret);
    debug!("Authorization redirect URI: {:?}", redirect_uri);

    let client = https_client()?;
    let auth = authenticator(
        secret,
        cfg.auth_flow,
        TokenCache::new(&cfg.token_path),
        client.clone(),
        Box::new(ConsolePrompt::new(redirect_uri)),
    )
    .await?;

    fetch_token(&auth).await?;
    info!("Authorized");

    Ok(Sheets::new(client, auth))
}
