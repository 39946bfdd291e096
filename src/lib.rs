pub(crate) mod api;
pub mod client;
pub mod clock;
pub mod config;
pub mod conversation;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod routing;
pub mod state;
pub mod stream;
pub mod transport;
pub mod upstream;
