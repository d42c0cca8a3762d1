//! SharePoint REST/OData client core
//!
//! Request composition, dispatch and response normalization for SharePoint
//! REST endpoints, plus the ProcessQuery (CSOM batch) protocol.
//!
//! The network is reached only through a [`Transport`]. The `remote` feature
//! (on by default) provides [`ReqwestTransport`]; tests and embedders can
//! supply their own.
//!
//! # Example
//!
//! ```
//! use sp_odata::{compose_url, normalize_collection, ODataMods};
//!
//! let mut mods = ODataMods::new();
//! mods.add_select("Id,Title").add_filter("Id gt 1").add_top(5);
//!
//! let url = compose_url("https://contoso.sharepoint.com/_api/web/lists", &mods);
//! assert_eq!(
//!     url,
//!     "https://contoso.sharepoint.com/_api/web/lists?$select=Id,Title&$filter=Id%20gt%201&$top=5"
//! );
//!
//! // Verbose and nometadata payloads normalize to the same item list.
//! let verbose = br#"{"d":{"results":[{"Id":2},{"Id":3}]}}"#;
//! let minimal = br#"{"value":[{"Id":2},{"Id":3}]}"#;
//! assert_eq!(
//!     normalize_collection(verbose).unwrap(),
//!     normalize_collection(minimal).unwrap()
//! );
//! ```
//!
//! # Response Shapes
//!
//! | Payload | Entity | Collection |
//! |---------|--------|------------|
//! | `{"d":{"results":[..]}}` | rejected | items of `results` |
//! | `{"d":{..}}` | inner object | rejected |
//! | `{"value":[..]}` or `[..]` | rejected | array items |
//! | any other object | the object | rejected |
//!
//! `{"error":{..}}` and `{"odata.error":{..}}` envelopes surface as
//! [`RemoteError`] in every mode.

mod client;
mod config;
mod csom;
mod endpoint;
mod error;
mod http;
mod modifiers;
mod normalize;
mod process_query;
mod resource;
mod response;

pub use client::{build_request, SpClient, Verb};
pub use config::{RequestConfig, Verbosity, DEFAULT_ACCEPT, WRITE_CONTENT_TYPE};
pub use csom::{Action, CsomBuilder, ObjectPath, Parameter, CLIENT_CONTEXT_TYPE_ID};
pub use endpoint::compose_url;
pub use error::{
    CsomError, DecodeError, NormalizeError, ProcessQueryError, RemoteError, RequestError,
    TransportError,
};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use modifiers::{ModifierKind, ODataMods};
pub use normalize::{normalize, normalize_collection, normalize_entity, Normalized};
pub use process_query::{decode_reply, process_query_endpoint, BatchReply};
pub use resource::Resource;
pub use response::{CollectionResponse, EntityResponse};

#[cfg(feature = "remote")]
pub use http::ReqwestTransport;
