//! In-memory booking store for development and testing

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{Booking, BookingFilter, BookingRepository, DomainError, DomainResult};
use crate::shared::types::PaginatedResult;

pub struct InMemoryBookingRepository {
    bookings: DashMap<String, Booking>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

impl Default for InMemoryBookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn get(&self, id: &str) -> DomainResult<Option<Booking>> {
        Ok(self.bookings.get(id).map(|b| b.clone()))
    }

    async fn list(&self, filter: &BookingFilter) -> DomainResult<PaginatedResult<Booking>> {
        let mut matching: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            b.scheduled_start
                .cmp(&a.scheduled_start)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as u64;
        let p = filter.pagination;
        let items = matching
            .into_iter()
            .skip(p.offset())
            .take(p.limit as usize)
            .collect();
        Ok(PaginatedResult::new(items, total, p.page, p.limit))
    }

    async fn insert(&self, booking: Booking) -> DomainResult<Booking> {
        match self.bookings.entry(booking.id.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict {
                entity: "Booking",
                id: booking.id,
                expected: booking.version,
            }),
            Entry::Vacant(slot) => {
                slot.insert(booking.clone());
                Ok(booking)
            }
        }
    }

    async fn save(&self, mut booking: Booking, expected_version: i64) -> DomainResult<Booking> {
        // compare-and-swap under the shard write lock
        let mut stored = self
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| DomainError::booking_not_found(&booking.id))?;

        if stored.version != expected_version {
            return Err(DomainError::Conflict {
                entity: "Booking",
                id: booking.id,
                expected: expected_version,
            });
        }

        booking.version = expected_version + 1;
        *stored = booking.clone();
        Ok(booking)
    }
}
