use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct HoldCreatedEvent {
    pub show_id: u64,
    pub hold_id: Uuid,
    pub seat_ids: Vec<String>,
    pub expires_at: i64,
    pub held_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseReason {
    Expired,
    Cancelled,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct HoldReleasedEvent {
    pub show_id: u64,
    pub hold_id: Uuid,
    pub seat_ids: Vec<String>,
    pub reason: ReleaseReason,
    pub released_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingConfirmedEvent {
    pub show_id: u64,
    pub booking_id: Uuid,
    pub hold_id: Uuid,
    pub seat_ids: Vec<String>,
    pub timestamp: i64,
}

/// Seat lifecycle notifications fanned out to subscribers (SSE streams, audit).
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatEvent {
    HoldCreated(HoldCreatedEvent),
    HoldReleased(HoldReleasedEvent),
    BookingConfirmed(BookingConfirmedEvent),
}

impl SeatEvent {
    pub fn show_id(&self) -> u64 {
        match self {
            SeatEvent::HoldCreated(e) => e.show_id,
            SeatEvent::HoldReleased(e) => e.show_id,
            SeatEvent::BookingConfirmed(e) => e.show_id,
        }
    }

    /// Name used for the SSE `event:` field.
    pub fn name(&self) -> &'static str {
        match self {
            SeatEvent::HoldCreated(_) => "hold_created",
            SeatEvent::HoldReleased(_) => "hold_released",
            SeatEvent::BookingConfirmed(_) => "booking_confirmed",
        }
    }
}
