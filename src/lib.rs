//! # emberplus-server
//!
//! Server for the Ember+ control protocol, used in broadcast infrastructure
//! to monitor and control device parameters organized as a hierarchical tree.
//!
//! The crate is layered, leaves first:
//!
//! - **S101 codec** ([`s101`]): escape-based framing with CRC-16 integrity
//!   checking and multi-packet reassembly.
//! - **Glow tree** ([`glow`]): arena-backed element tree (nodes, parameters,
//!   matrices) plus the BER wire codec for decoded requests and responses.
//! - **Server** ([`server`]): TCP listener, per-connection request pipeline
//!   with keepalive, and the dispatcher that applies requests against the
//!   tree and fans change notifications out to subscribers.
//!
//! ## Example
//!
//! ```ignore
//! use emberplus_server::{EmberServer, ServerConfig};
//! use emberplus_server::glow::Tree;
//!
//! #[tokio::main]
//! async fn main() -> emberplus_server::Result<()> {
//!     let tree = Tree::from_json(include_str!("../demos/tree.json"))?;
//!     let mut server = EmberServer::new(ServerConfig::new("0.0.0.0", 9000), tree);
//!
//!     if let Some(mut events) = server.events() {
//!         tokio::spawn(async move {
//!             while let Some(event) = events.recv().await {
//!                 println!("{event:?}");
//!             }
//!         });
//!     }
//!
//!     server.listen().await
//! }
//! ```

pub mod error;
pub mod glow;
pub mod s101;
pub mod server;

pub use error::{EmberError, Result};
pub use server::{ClientHandle, EmberServer, ServerConfig, ServerEvent, ServerHandle};
