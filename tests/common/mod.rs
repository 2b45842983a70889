/*!
 * Common test utilities shared across the test suite
 */

pub mod mock_backend;
