// Typed access to Wikidata: entity search, claims, metadata and SPARQL

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod types;

pub use client::WikidataClient;
pub use config::WikidataConfig;
pub use error::{WikidataError, WikidataResult};
pub use http::{HttpClient, RemoteQuery, ReqwestClient};
pub use types::*;
