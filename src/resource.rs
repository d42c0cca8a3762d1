//! Fluent resource addressing over a client.

use crate::client::SpClient;
use crate::config::RequestConfig;
use crate::endpoint::compose_url;
use crate::error::RequestError;
use crate::http::Transport;
use crate::modifiers::ODataMods;
use crate::response::{CollectionResponse, EntityResponse};

/// A REST resource address with its request config and OData modifiers.
///
/// Modifier methods consume and return the resource, so a chain owns exactly
/// one [`ODataMods`] and never copies it.
///
/// ```
/// use sp_odata::{HttpRequest, HttpResponse, SpClient, Transport, TransportError};
///
/// struct Offline;
/// impl Transport for Offline {
///     fn execute(&self, _: &HttpRequest) -> Result<HttpResponse, TransportError> {
///         Err(TransportError::new("offline"))
///     }
/// }
///
/// let client = SpClient::new(Offline);
/// let url = client
///     .resource("https://contoso.sharepoint.com/_api/web/lists")
///     .select("Id,Title")
///     .top(10)
///     .to_url();
/// assert_eq!(url, "https://contoso.sharepoint.com/_api/web/lists?$select=Id,Title&$top=10");
/// ```
#[derive(Debug)]
pub struct Resource<'a, T> {
    client: &'a SpClient<T>,
    endpoint: String,
    config: Option<RequestConfig>,
    modifiers: ODataMods,
}

impl<'a, T: Transport> Resource<'a, T> {
    pub fn new(client: &'a SpClient<T>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            config: None,
            modifiers: ODataMods::new(),
        }
    }

    /// Replace the request config, e.g. with a verbosity preset.
    pub fn conf(mut self, config: &RequestConfig) -> Self {
        self.config = Some(config.clone());
        self
    }

    pub fn select(mut self, fields: &str) -> Self {
        self.modifiers.add_select(fields);
        self
    }

    pub fn expand(mut self, fields: &str) -> Self {
        self.modifiers.add_expand(fields);
        self
    }

    pub fn filter(mut self, expr: &str) -> Self {
        self.modifiers.add_filter(expr);
        self
    }

    pub fn top(mut self, n: usize) -> Self {
        self.modifiers.add_top(n);
        self
    }

    pub fn order_by(mut self, field: &str, ascending: bool) -> Self {
        self.modifiers.add_order_by(field, ascending);
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.modifiers.add_skip(n);
        self
    }

    pub fn skip_token(mut self, token: &str) -> Self {
        self.modifiers.add_skip_token(token);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> Option<&RequestConfig> {
        self.config.as_ref()
    }

    pub fn modifiers(&self) -> &ODataMods {
        &self.modifiers
    }

    /// Endpoint with modifiers applied.
    pub fn to_url(&self) -> String {
        compose_url(&self.endpoint, &self.modifiers)
    }

    /// GET the resource as a single entity.
    pub fn get_entity(&self) -> Result<EntityResponse, RequestError> {
        self.client
            .get(&self.to_url(), self.config.as_ref())
            .map(EntityResponse::new)
    }

    /// GET the resource as a collection.
    pub fn get_collection(&self) -> Result<CollectionResponse, RequestError> {
        self.client
            .get(&self.to_url(), self.config.as_ref())
            .map(CollectionResponse::new)
    }

    /// POST `body` to the resource endpoint (modifiers are not applied).
    pub fn post(&self, body: Vec<u8>) -> Result<EntityResponse, RequestError> {
        self.client
            .post(&self.endpoint, Some(body), self.config.as_ref())
            .map(EntityResponse::new)
    }

    /// MERGE `body` into the resource.
    pub fn update(&self, body: Vec<u8>) -> Result<EntityResponse, RequestError> {
        self.client
            .update(&self.endpoint, body, self.config.as_ref())
            .map(EntityResponse::new)
    }

    /// Delete the resource.
    pub fn delete(&self) -> Result<(), RequestError> {
        self.client
            .delete(&self.endpoint, self.config.as_ref())
            .map(|_| ())
    }
}
