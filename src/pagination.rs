//! Continuation-token pagination.
//!
//! The first request goes out with all of its filters. Every following
//! request carries only the identifying path parameters and the server's
//! continuation token wrapped in single quotes. Pages are fetched one after
//! another until the server stops returning a token.

use tracing::debug;

use crate::connector::Connector;
use crate::error::Result;
use crate::request::Request;

/// A request whose responses may continue on further pages.
pub trait ContinuationTokenPagination: Request + Sized {
    type Item: Send;

    /// The follow-up request: identifying path parameters plus `token`, nothing else.
    fn with_only_continuation_token(&self, token: &str) -> Self;

    /// Split a page into its items and the next continuation token.
    fn into_page(output: Self::Output) -> (Vec<Self::Item>, Option<String>);
}

/// `abc` -> `'abc'`, the form the API expects when a token is echoed back.
pub fn quote_continuation_token(token: &str) -> String {
    format!("'{}'", token)
}

impl Connector {
    /// Fetch every page of `request` and return the items in order.
    ///
    /// Any failing page fails the whole call.
    pub async fn get_all_pages<R: ContinuationTokenPagination>(
        &self,
        request: &R,
    ) -> Result<Vec<R::Item>> {
        let (mut items, mut token) = R::into_page(self.send(request).await?);
        let mut pages = 1;

        // An empty token is treated like a missing one.
        while let Some(next) = token.filter(|t| !t.is_empty()) {
            let follow_up = request.with_only_continuation_token(&next);
            let (page_items, next_token) = R::into_page(self.send(&follow_up).await?);
            items.extend(page_items);
            token = next_token;
            pages += 1;
        }

        debug!("Fetched {} items over {} pages", items.len(), pages);
        Ok(items)
    }
}
