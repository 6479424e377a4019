//! # AQA Corpus
//!
//! A client for managed semantic-retrieval corpora and attributed question
//! answering (the Generative Language `corpora` API and the `models/aqa`
//! answer model).
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌──────────┐   ┌────────────┐
//! │ ServiceClient │──▶│ Corpus   │──▶│ Document   │
//! │ (credentials) │   │ docs/QA  │   │ chunks +   │
//! └──────┬────────┘   └──────────┘   │ ingestion  │
//!        │                           └─────┬──────┘
//!        ▼                                 ▼
//!  ┌────────────────────────┐      ┌──────────────────┐
//!  │ Retriever / Generative │      │ chunk planning,  │
//!  │ / Permission services  │      │ HTML chunker,    │
//!  │ (REST transport)       │      │ Wikipedia lookup │
//!  └────────────────────────┘      └──────────────────┘
//! ```
//!
//! Handles borrow their parent: a [`Document`] borrows its [`Corpus`], which
//! borrows the [`ServiceClient`]. Every method performs its remote calls one
//! at a time and returns the service's own errors without retrying.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | Service client and corpus CRUD |
//! | [`corpus`] | Corpus handle: documents, answers, permissions |
//! | [`document`] | Document handle and ingestion pipeline |
//! | [`chunk`] | Text windowing and batch planning |
//! | [`html_chunker`] | HTML passage extraction |
//! | [`wikipedia`] | Article title resolution and extract parsing |
//! | [`web`] | Page and article fetching |
//! | [`services`] | Remote service traits |
//! | [`transport`] | REST implementation of the services |
//! | [`auth`] | Access tokens |
//! | [`models`] | Wire types |
//! | [`metadata`] | Typed custom metadata |
//! | [`config`] | TOML configuration |
//! | [`logging`] | Logger setup |
//! | [`error`] | Remote error type |

pub mod auth;
pub mod chunk;
pub mod client;
pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod html_chunker;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod services;
pub mod transport;
pub mod web;
pub mod wikipedia;

pub use client::ServiceClient;
pub use corpus::{AnswerOptions, Corpus};
pub use document::{Document, IngestReport};
pub use error::ApiError;
pub use metadata::Metadata;
pub use models::AnswerStyle;
