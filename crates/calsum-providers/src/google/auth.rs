//! Pluggable authorization flows.
//!
//! Obtaining a first token is a startup capability, selected once on the
//! command line, and is never invoked from a request path. Three variants:
//!
//! - [`TerminalAuthorizer`] - print the auth URL, read the code from stdin
//! - [`ProvisionedTokenAuthorizer`] - require an existing token file
//! - [`DeviceCodeAuthorizer`] - RFC 8628 device grant, polled

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::BoxFuture;

use super::oauth::{OAuthClient, PkceChallenge};
use super::tokens::TokenInfo;

/// An authorization flow that can produce a first token set.
pub trait Authorizer: Send + Sync {
    /// Flow name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Runs the flow to completion and returns the obtained tokens.
    fn authorize<'a>(
        &'a self,
        oauth: &'a OAuthClient,
        scopes: &'a [String],
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>>;
}

/// Interactive terminal flow: prints the authorization URL once and blocks
/// reading the pasted code from stdin.
#[derive(Debug, Default)]
pub struct TerminalAuthorizer;

impl Authorizer for TerminalAuthorizer {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn authorize<'a>(
        &'a self,
        oauth: &'a OAuthClient,
        scopes: &'a [String],
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            let pkce = PkceChallenge::new();
            let url = oauth.auth_url(&pkce, scopes);

            // Reading stdin is blocking; keep it off the runtime threads.
            let code = tokio::task::spawn_blocking(move || {
                let stdin = io::stdin();
                let stderr = io::stderr();
                prompt_for_code(stdin.lock(), stderr.lock(), &url)
            })
            .await
            .map_err(|e| ProviderError::internal(format!("prompt task failed: {}", e)))?
            .map_err(|e| {
                ProviderError::authentication(format!(
                    "failed to read authorization code: {}",
                    e
                ))
            })?;

            info!("authorization code received, exchanging for tokens");
            oauth.exchange_code(&code, &pkce, scopes).await
        })
    }
}

/// Prints the authorization URL exactly once and reads exactly one line.
fn prompt_for_code<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    auth_url: &str,
) -> io::Result<String> {
    writeln!(
        output,
        "Go to the following link in your browser, then paste the authorization code:\n\n{}\n",
        auth_url
    )?;
    write!(output, "authorization code: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let code = line.trim();
    if code.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty authorization code",
        ));
    }
    Ok(code.to_string())
}

/// Pre-provisioned token flow: there is nothing to obtain interactively,
/// so reaching this authorizer means the token file was missing or unusable.
#[derive(Debug)]
pub struct ProvisionedTokenAuthorizer {
    token_path: PathBuf,
}

impl ProvisionedTokenAuthorizer {
    /// Creates the flow; `token_path` is only used for the error message.
    pub fn new(token_path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: token_path.into(),
        }
    }
}

impl Authorizer for ProvisionedTokenAuthorizer {
    fn name(&self) -> &'static str {
        "token"
    }

    fn authorize<'a>(
        &'a self,
        _oauth: &'a OAuthClient,
        _scopes: &'a [String],
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            Err(ProviderError::configuration(format!(
                "no usable token at {:?}; the 'token' flow requires a pre-provisioned token file",
                self.token_path
            )))
        })
    }
}

/// Device authorization grant: shows a short user code and polls the token
/// endpoint until the user approves the grant elsewhere.
#[derive(Debug, Default)]
pub struct DeviceCodeAuthorizer;

impl Authorizer for DeviceCodeAuthorizer {
    fn name(&self) -> &'static str {
        "device"
    }

    fn authorize<'a>(
        &'a self,
        oauth: &'a OAuthClient,
        scopes: &'a [String],
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            let device = oauth.start_device_flow(scopes).await?;

            eprintln!(
                "On another device, go to {} and enter the code: {}",
                device.verification_url, device.user_code
            );
            info!(
                verification_url = %device.verification_url,
                "waiting for device grant approval"
            );

            oauth.poll_device_token(&device, scopes).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    use super::super::config::OAuthCredentials;

    #[test]
    fn prompt_prints_url_once_and_reads_one_line() {
        let mut output = Vec::new();
        let input = Cursor::new(b"4/pasted-code\nshould-not-be-read\n".to_vec());

        let code =
            prompt_for_code(input, &mut output, "https://example.com/auth?x=1").unwrap();

        assert_eq!(code, "4/pasted-code");
        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("https://example.com/auth?x=1").count(), 1);
        assert!(!printed.contains("should-not-be-read"));
    }

    #[test]
    fn prompt_trims_surrounding_whitespace() {
        let mut output = Vec::new();
        let input = Cursor::new(b"  4/code  \n".to_vec());
        let code = prompt_for_code(input, &mut output, "url").unwrap();
        assert_eq!(code, "4/code");
    }

    #[test]
    fn prompt_rejects_empty_input() {
        let mut output = Vec::new();
        let input = Cursor::new(b"\n".to_vec());
        assert!(prompt_for_code(input, &mut output, "url").is_err());
    }

    #[tokio::test]
    async fn provisioned_flow_never_obtains_tokens() {
        let oauth = OAuthClient::new(
            OAuthCredentials::new("id", "secret"),
            Duration::from_secs(5),
        )
        .unwrap();
        let authorizer = ProvisionedTokenAuthorizer::new("token.json");

        let err = authorizer
            .authorize(&oauth, &["scope".to_string()])
            .await
            .unwrap_err();
        assert!(err.message().contains("token.json"));
    }

    #[test]
    fn flow_names() {
        assert_eq!(TerminalAuthorizer.name(), "terminal");
        assert_eq!(ProvisionedTokenAuthorizer::new("t").name(), "token");
        assert_eq!(DeviceCodeAuthorizer.name(), "device");
    }
}
