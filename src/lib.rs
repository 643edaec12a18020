//! PlanetScale provider plugin.
//!
//! Manages PlanetScale databases, branches, branch passwords, backups and
//! deploy requests for an infrastructure-as-code host, and exposes read-only
//! data sources over the same entities plus regions.
//!
//! # Architecture
//!
//! - [`server`] speaks the `provider.v1` gRPC protocol and prints the
//!   handshake line; [`provider::PlanetScaleProvider`] implements
//!   [`ProviderService`] on top of it.
//! - `Configure` resolves credentials from provider configuration and the
//!   `PLANETSCALE_*` environment variables ([`config`]), builds one
//!   [`client::PlanetScaleApi`] handle and injects it into every adapter.
//! - [`resources`] and [`data_sources`] map between JSON state and the API
//!   models in [`models`], one API call per operation.
//! - [`plan`] and [`validation`] are schema-driven and shared by all types.
//!
//! # Handshake
//!
//! ```text
//! PROVIDER_PLUGIN|1|127.0.0.1:50051
//! ```
//!
//! Format: `PROVIDER_PLUGIN|<protocol_version>|<address>`. Logs go to stderr.

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod import_id;
pub mod logging;
pub mod models;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use client::{ApiError, Client, PlanetScaleApi, SharedClient};
pub use config::{ProviderConfig, ResolvedConfig};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::PlanetScaleProvider;
pub use schema::ProviderSchema;
pub use server::{serve, serve_on, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
