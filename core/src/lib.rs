//! Blocking API client for the movie streaming platform's admin backend.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `Transport` performs the
//! single round trip of each operation; `UreqTransport` is the stock one.
//!
//! # Design
//! - `AdminClient` holds configuration and an injected `SessionContext`;
//!   the bearer token is read from the session for every request.
//! - Each backend operation is split into `build_*` (produces the request)
//!   and a shared `parse_*` step, so the I/O boundary is explicit.
//!   `AdminApi` joins the two over a transport.
//! - Responses pass through `normalize`, which tolerates empty, text and
//!   mislabelled JSON bodies and only fails on a failure status.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod assets;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod normalize;
pub mod session;
pub mod transport;
pub mod types;

pub use assets::resolve_static_url;
pub use client::{
    movie_update_form, new_episode_form, new_movie_form, parse_ack, parse_list, parse_outcome,
    parse_record, AdminApi, AdminClient,
};
pub use config::ClientConfig;
pub use error::{ApiError, ValidationError};
pub use http::{Body, FilePart, HttpMethod, HttpRequest, HttpResponse, MultipartForm};
pub use session::{FileStorage, MemoryStorage, Session, SessionContext, SessionStorage, SessionUser};
pub use transport::{Transport, UreqTransport};
pub use types::*;
