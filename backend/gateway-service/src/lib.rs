//! Orchestration layer tying merchant configuration, the processor
//! transport and the transaction audit trail into one payment service.

pub mod ledger;
pub mod service;
pub mod settings;
pub mod transport;

pub use ledger::TransactionLedger;
pub use service::PaymentService;
pub use settings::{InMemorySettingsRepository, SettingsRepository};
pub use transport::{HttpProcessorTransport, ProcessorTransport};
