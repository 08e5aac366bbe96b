//! Check-in token codec
//!
//! Wire format: `HOTEL_EVENT:<eventId>:<bookingId>:<guestName>:<eventTitle>`.
//! The title is everything after the fourth colon and may itself contain
//! colons.

use thiserror::Error;

use crate::domain::booking::Booking;

pub const TOKEN_PREFIX: &str = "HOTEL_EVENT:";

/// Upper bound on accepted payload size; QR codes never get close.
pub const MAX_TOKEN_LEN: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token does not start with {TOKEN_PREFIX}")]
    MissingPrefix,

    #[error("token is longer than {MAX_TOKEN_LEN} bytes")]
    TooLong,

    #[error("token has {found} field(s), expected at least 5")]
    MissingFields { found: usize },

    #[error("token field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("`{0}` must not contain ':'")]
    DelimiterInField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInToken {
    pub event_id: String,
    pub booking_id: String,
    pub guest_name: String,
    pub event_title: String,
}

impl CheckInToken {
    /// Parse an untrusted scanned payload.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        if raw.len() > MAX_TOKEN_LEN {
            return Err(TokenError::TooLong);
        }
        let rest = raw
            .strip_prefix(TOKEN_PREFIX)
            .ok_or(TokenError::MissingPrefix)?;

        // prefix counts as the first field
        let fields: Vec<&str> = rest.splitn(4, ':').collect();
        if fields.len() < 4 {
            return Err(TokenError::MissingFields {
                found: fields.len() + 1,
            });
        }

        let event_id = non_empty(fields[0], "eventId")?;
        let booking_id = non_empty(fields[1], "bookingId")?;
        let guest_name = non_empty(fields[2], "guestName")?;

        Ok(Self {
            event_id,
            booking_id,
            guest_name,
            event_title: fields[3].to_string(),
        })
    }

    /// Token for an event booking, as printed on the guest's QR code.
    pub fn for_booking(booking: &Booking, event_title: impl Into<String>) -> Result<Self, TokenError> {
        let token = Self {
            event_id: booking.resource_id.clone(),
            booking_id: booking.id.clone(),
            guest_name: booking.guest_name.clone(),
            event_title: event_title.into(),
        };
        token.check_encodable()?;
        Ok(token)
    }

    fn check_encodable(&self) -> Result<(), TokenError> {
        for (value, field) in [
            (&self.event_id, "eventId"),
            (&self.booking_id, "bookingId"),
            (&self.guest_name, "guestName"),
        ] {
            if value.is_empty() {
                return Err(TokenError::EmptyField(field));
            }
            if value.contains(':') {
                return Err(TokenError::DelimiterInField(field));
            }
        }
        if self.encode_unchecked().len() > MAX_TOKEN_LEN {
            return Err(TokenError::TooLong);
        }
        Ok(())
    }

    fn encode_unchecked(&self) -> String {
        format!(
            "{}{}:{}:{}:{}",
            TOKEN_PREFIX, self.event_id, self.booking_id, self.guest_name, self.event_title
        )
    }

    /// Wire representation. Fails if a leading field would shift the
    /// delimiters on decode.
    pub fn encode(&self) -> Result<String, TokenError> {
        self.check_encodable()?;
        Ok(self.encode_unchecked())
    }
}

fn non_empty(value: &str, field: &'static str) -> Result<String, TokenError> {
    if value.trim().is_empty() {
        Err(TokenError::EmptyField(field))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::model::tests::event_booking;

    #[test]
    fn parses_plain_token() {
        let t = CheckInToken::parse("HOTEL_EVENT:e1:b1:John Smith:Summer Jazz Night").unwrap();
        assert_eq!(t.event_id, "e1");
        assert_eq!(t.booking_id, "b1");
        assert_eq!(t.guest_name, "John Smith");
        assert_eq!(t.event_title, "Summer Jazz Night");
    }

    #[test]
    fn title_keeps_its_colons() {
        let t = CheckInToken::parse("HOTEL_EVENT:e1:b1:Ann:Gala: Night 2: The Return").unwrap();
        assert_eq!(t.event_title, "Gala: Night 2: The Return");
    }

    #[test]
    fn empty_title_is_accepted() {
        let t = CheckInToken::parse("HOTEL_EVENT:e1:b1:Ann:").unwrap();
        assert_eq!(t.event_title, "");
    }

    #[test]
    fn rejects_missing_prefix() {
        assert_eq!(
            CheckInToken::parse("NOT_A_HOTEL_CODE"),
            Err(TokenError::MissingPrefix)
        );
        assert_eq!(
            CheckInToken::parse("hotel_event:e1:b1:Ann:Gala"),
            Err(TokenError::MissingPrefix)
        );
    }

    #[test]
    fn rejects_too_few_fields() {
        assert_eq!(
            CheckInToken::parse("HOTEL_EVENT:e1:b1:Ann"),
            Err(TokenError::MissingFields { found: 4 })
        );
        assert_eq!(
            CheckInToken::parse("HOTEL_EVENT:"),
            Err(TokenError::MissingFields { found: 2 })
        );
    }

    #[test]
    fn rejects_empty_fields() {
        assert_eq!(
            CheckInToken::parse("HOTEL_EVENT::b1:Ann:Gala"),
            Err(TokenError::EmptyField("eventId"))
        );
        assert_eq!(
            CheckInToken::parse("HOTEL_EVENT:e1: :Ann:Gala"),
            Err(TokenError::EmptyField("bookingId"))
        );
    }

    #[test]
    fn rejects_oversized_payload() {
        let raw = format!("HOTEL_EVENT:e1:b1:Ann:{}", "x".repeat(MAX_TOKEN_LEN));
        assert_eq!(CheckInToken::parse(&raw), Err(TokenError::TooLong));
    }

    #[test]
    fn encode_matches_wire_format() {
        let booking = event_booking("b1");
        let token = CheckInToken::for_booking(&booking, "Summer Jazz Night").unwrap();
        assert_eq!(
            token.encode().unwrap(),
            "HOTEL_EVENT:e1:b1:John Smith:Summer Jazz Night"
        );
        assert_eq!(CheckInToken::parse(&token.encode().unwrap()).unwrap(), token);
    }

    #[test]
    fn encode_refuses_colon_in_guest_name() {
        let mut booking = event_booking("b1");
        booking.guest_name = "Dr: Who".into();
        assert_eq!(
            CheckInToken::for_booking(&booking, "Gala"),
            Err(TokenError::DelimiterInField("guestName"))
        );
    }
}
