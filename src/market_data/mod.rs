pub mod calendar;
pub mod contract;
pub mod provider;
pub mod snapshot;

pub use calendar::{parse_trade_date, recent_trade_date};
pub use contract::Contract;
pub use provider::{JsonFileProvider, PositionProvider};
#[cfg(test)]
pub use provider::{ContractQuote, InMemoryProvider, VarietyDay};
pub use snapshot::{Seat, VarietySnapshot};
