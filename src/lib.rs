//! # Hotel Booking Core
//!
//! Booking lifecycle, refund policy evaluation and QR check-in for hotel
//! rooms and hotel-hosted events.
//!
//! ## Architecture
//!
//! - **domain**: bookings, the lifecycle state machine, refund policy and
//!   check-in tokens; no I/O
//! - **application**: services that serialize concurrent transitions,
//!   refund and scan audit trails, role-based visibility, the event bus
//! - **infrastructure**: SeaORM (SQLite) and in-memory booking stores
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::{init_database, DatabaseConfig, InMemoryBookingRepository, SeaOrmBookingRepository};

pub use interfaces::{create_api_router, ApiState};

pub use application::{create_event_bus, BookingService, CheckInVerifier, RefundGateway, SharedEventBus};
