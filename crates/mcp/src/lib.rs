// MCP (Model Context Protocol) server exposing Wikidata lookups as tools

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
