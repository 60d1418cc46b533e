//! MCP dispatch surface.
//!
//! Exposes every resource's read operations as MCP tools over streamable
//! HTTP. The tools stay thin: validate the identifier, call the resource,
//! serialize the projection, map typed errors to tool error responses.

mod params;
mod server;
mod service;


pub use params::IdParams;
pub use server::McpServer;
pub use service::create_mcp_service;
