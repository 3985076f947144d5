//! Seams between the engine and its host environment.

mod clock;
mod connectivity;
mod fetch_strategy;
mod hint_sink;
mod key_value_store;
mod telemetry;

pub use clock::{IClock, ManualClock, SystemClock};
pub use connectivity::IConnectivity;
pub use fetch_strategy::IFetchStrategy;
pub use hint_sink::IHintSink;
pub use key_value_store::IKeyValueStore;
pub use telemetry::{ITelemetry, NoopTelemetry};
