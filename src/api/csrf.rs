// Anti-forgery token provider
//
// Every form used to repeat the acquire-token dance on its own; this provider
// is the single shared copy. The token is memoized for the lifetime of a gated
// navigation and refreshed only after an explicit 403.

use super::{ApiClient, ApiError};
use std::sync::Mutex;

/// Memoizing holder for the anti-forgery token
///
/// Acquisition order: existing cookie-jar token, then the dedicated token
/// endpoint. `invalidate` drops the memo so the next caller re-acquires.
#[derive(Default)]
pub struct CsrfToken {
    cached: Mutex<Option<String>>,
}

impl CsrfToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized token, acquiring one if none is held
    pub async fn get_or_fetch(&self, api: &ApiClient) -> Result<String, ApiError> {
        if let Some(token) = self.cached.lock().unwrap().clone() {
            return Ok(token);
        }

        let token = api.acquire_csrf().await?;
        *self.cached.lock().unwrap() = Some(token.clone());
        Ok(token)
    }

    /// Drop the memoized token (after a 403 or on logout)
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap() = None;
    }

    /// Whether a token is currently memoized
    #[cfg(test)]
    fn is_cached(&self) -> bool {
        self.cached.lock().unwrap().is_some()
    }

    /// Seed the memo directly
    #[cfg(test)]
    fn seed(&self, token: &str) {
        *self.cached.lock().unwrap() = Some(token.to_string());
    }
}

/// Run `op` with a token, re-acquiring once if the server answers 403
///
/// This is the only retry in the client: a stale token is replaced exactly
/// once, any other failure propagates unchanged.
pub async fn with_token<T, F, Fut>(
    provider: &CsrfToken,
    api: &ApiClient,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = Result<T, ApiError>>,
{
    let token = provider.get_or_fetch(api).await?;
    match op(token).await {
        Err(e) if e.is_forbidden() => {
            tracing::debug!("Anti-forgery token rejected, re-acquiring once");
            provider.invalidate();
            let fresh = provider.get_or_fetch(api).await?;
            op(fresh).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_clears_the_memo() {
        let provider = CsrfToken::new();
        provider.seed("tok");
        assert!(provider.is_cached());

        provider.invalidate();
        assert!(!provider.is_cached());
    }

    #[tokio::test]
    async fn memoized_token_is_returned_without_network() {
        // A client pointed at an unroutable origin: any real acquisition
        // attempt would error, so success proves the memo was used.
        let mut config = crate::config::Config::default();
        config.base_url = "http://127.0.0.1:1".to_string();
        let api = ApiClient::new(&config).unwrap();

        let provider = CsrfToken::new();
        provider.seed("memoized");

        let token = provider.get_or_fetch(&api).await.unwrap();
        assert_eq!(token, "memoized");
    }
}
