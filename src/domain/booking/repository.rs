//! Booking repository interface

use async_trait::async_trait;

use super::model::{Booking, BookingSource, BookingStatus, ResourceKind};
use crate::domain::DomainResult;
use crate::shared::types::{PaginatedResult, PaginationParams};

/// List filter; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub resource_id: Option<String>,
    pub resource_kind: Option<ResourceKind>,
    pub status: Option<BookingStatus>,
    pub source: Option<BookingSource>,
    pub pagination: PaginationParams,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.resource_id
            .as_deref()
            .map_or(true, |id| booking.resource_id == id)
            && self.resource_kind.map_or(true, |k| booking.resource_kind == k)
            && self.status.map_or(true, |s| booking.status == s)
            && self.source.map_or(true, |s| booking.source == s)
    }
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find booking by ID
    async fn get(&self, id: &str) -> DomainResult<Option<Booking>>;

    /// Bookings matching the filter, newest scheduled start first
    async fn list(&self, filter: &BookingFilter) -> DomainResult<PaginatedResult<Booking>>;

    /// Store a new booking. Fails with `Conflict` if the ID is taken.
    async fn insert(&self, booking: Booking) -> DomainResult<Booking>;

    /// Replace the stored booking if its version still equals
    /// `expected_version`; returns the booking with the bumped version.
    /// A stale version yields `DomainError::Conflict`.
    async fn save(&self, booking: Booking, expected_version: i64) -> DomainResult<Booking>;
}
