pub mod attestor;
pub mod memory_token;
pub mod mock_rollup;
