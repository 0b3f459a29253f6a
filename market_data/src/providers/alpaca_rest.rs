//! Alpaca market data REST API (`/v2/stocks/bars`).
//!
//! Requires `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`. Responses are paged;
//! the provider follows `next_page_token` until the range is exhausted.

pub mod params;
pub mod provider;
pub mod response;

pub use params::AlpacaBarsParams;
pub use provider::AlpacaProvider;
