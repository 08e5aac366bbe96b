//! QR check-in verifier
//!
//! Turns a scanned payload into at most one `CheckIn` transition and
//! records a [`ScanResult`] for every scan, successful or not.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::booking::BookingService;
use crate::domain::{
    ActorRole, BookingTransition, CheckInToken, DomainError, ErrorKind, ScanResult,
    TransitionContext,
};
use crate::shared::AuditTrail;

pub const DEFAULT_SCAN_HISTORY_LIMIT: usize = 200;

pub struct CheckInVerifier {
    bookings: Arc<BookingService>,
    scans: AuditTrail<ScanResult>,
    sessions: DashMap<String, Arc<Mutex<()>>>,
}

impl CheckInVerifier {
    pub fn new(bookings: Arc<BookingService>, scan_history_limit: usize) -> Self {
        Self {
            bookings,
            scans: AuditTrail::new(scan_history_limit),
            sessions: DashMap::new(),
        }
    }

    /// Verify a scanned token and check the booking in.
    pub async fn scan(&self, raw: &str, actor_role: ActorRole) -> ScanResult {
        let result = self.verify(raw, actor_role).await;

        let label = if result.success {
            "success"
        } else if result.duplicate {
            "duplicate"
        } else {
            result.error_kind.map_or("failure", |k| k.as_str())
        };
        metrics::counter!("checkin_scans_total", "result" => label).increment(1);

        if result.success {
            info!(booking_id = ?result.booking_id, "Check-in accepted");
        } else {
            warn!(
                booking_id = ?result.booking_id,
                result = label,
                message = %result.message,
                "Check-in rejected"
            );
        }

        self.scans.record(result.clone());
        result
    }

    /// Like [`scan`](Self::scan), but scans within one physical scanning
    /// session run one at a time.
    ///
    /// A session only occupies the map while scans for it are in flight or
    /// queued, so arbitrary client-chosen ids cannot grow it.
    pub async fn scan_in_session(&self, session_id: &str, raw: &str, actor_role: ActorRole) -> ScanResult {
        let lock = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _in_flight = lock.lock().await;
        let result = self.scan(raw, actor_role).await;

        // One reference is the map's, one is ours. Anything above that is a
        // queued scan which will clean up after itself.
        self.sessions.remove_if(session_id, |_, held| {
            Arc::ptr_eq(held, &lock) && Arc::strong_count(held) == 2
        });
        result
    }

    /// Forget a scanning session. Returns whether scans were still queued on it.
    pub fn end_session(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Sessions with scans in flight or queued.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Most recent scans, newest first.
    pub fn recent_scans(&self, limit: usize) -> Vec<ScanResult> {
        self.scans.recent(limit)
    }

    async fn verify(&self, raw: &str, actor_role: ActorRole) -> ScanResult {
        let now = Utc::now();

        // Scanners in keyboard-wedge mode append a line terminator; anything
        // else is part of the payload.
        let token = match CheckInToken::parse(raw.trim_end_matches(['\r', '\n'])) {
            Ok(token) => token,
            Err(e) => {
                return ScanResult::failure(
                    format!("Invalid QR code: {}", e),
                    ErrorKind::MalformedInput,
                    now,
                )
            }
        };

        let failed = |err: DomainError| ScanResult {
            booking_id: Some(token.booking_id.clone()),
            guest_name: Some(token.guest_name.clone()),
            event_title: Some(token.event_title.clone()),
            ..ScanResult::failure(err.to_string(), err.kind(), now)
        };

        let booking = match self.bookings.get(&token.booking_id).await {
            Ok(booking) => booking,
            Err(e) => return failed(e),
        };

        if !booking.is_event() || booking.resource_id != token.event_id {
            return failed(DomainError::EventMismatch {
                booking_id: booking.id,
                expected: token.event_id.clone(),
                actual: booking.resource_id,
            });
        }

        let ctx = TransitionContext::at(actor_role, now);
        match self
            .bookings
            .transition(&token.booking_id, BookingTransition::CheckIn, ctx)
            .await
        {
            Ok(report) if report.outcome.is_applied() => ScanResult {
                success: true,
                message: format!("{} checked in", report.booking.guest_name),
                booking_id: Some(report.booking.id),
                guest_name: Some(token.guest_name.clone()),
                event_title: Some(token.event_title.clone()),
                timestamp: now,
                error_kind: None,
                duplicate: false,
            },
            Ok(report) => ScanResult {
                success: false,
                message: format!("{} is already checked in", report.booking.guest_name),
                booking_id: Some(report.booking.id),
                guest_name: Some(token.guest_name.clone()),
                event_title: Some(token.event_title.clone()),
                timestamp: now,
                error_kind: None,
                duplicate: true,
            },
            Err(e) => failed(e),
        }
    }
}
