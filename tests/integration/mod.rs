/// Integration test suite: the server over a real database file
mod basic_integration;
mod mcp_session;
