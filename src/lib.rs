//! Hub client - main library
//!
//! Thin application layer over the `hubsockets` transport.
//!
//! ## Architecture
//!
//! - **hubsockets**: WebSocket transport and default hub connection (re-exported from workspace)
//! - **bin_common**: Common utilities for binary executables (config path, logging)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use hub_client::bin_common::{init_tracing, load_config_from_env, ConfigType};
//! use hub_client::hubsockets::HubConfig;
//! ```

// Re-export workspace libraries for convenience
pub use hubsockets;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod logging;

    pub use cli::{load_config_from_env, parse_args, resolve_config_type, ConfigType};
    pub use logging::init_tracing;
}
