pub mod health;
pub mod info;
pub mod mcp;
pub mod sse;
