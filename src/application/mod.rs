pub mod events;
pub mod services;
pub mod visibility;

pub use events::{create_event_bus, Event, EventBus, EventSubscriber, SharedEventBus};
pub use services::{
    BookingService, CheckInVerifier, RefundAuditEntry, RefundAuditOutcome, RefundGateway,
    RefundGatewayConfig, RefundReceipt, RefundRequest, TransitionReport,
};
pub use visibility::BookingView;
