// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names read by Docket

// Storage Location
pub const DOCKET_HOME: &str = "DOCKET_HOME";
pub const DOCKET_DATABASE_PATH: &str = "DOCKET_DATABASE_PATH";

// Connection Pool
pub const DOCKET_DB_MAX_CONNECTIONS: &str = "DOCKET_DB_MAX_CONNECTIONS";
pub const DOCKET_DB_ACQUIRE_TIMEOUT_SECS: &str = "DOCKET_DB_ACQUIRE_TIMEOUT_SECS";

// Workflow Engine
pub const DOCKET_WRITE_RETRIES: &str = "DOCKET_WRITE_RETRIES";

// Listing
pub const DOCKET_DEFAULT_PAGE_SIZE: &str = "DOCKET_DEFAULT_PAGE_SIZE";

// System Environment Variables
pub const HOME: &str = "HOME";
