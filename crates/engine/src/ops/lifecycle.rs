use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Booking, BookingEvent, BookingStatus, EngineError, NewDraftBookingCmd, ResultEngine,
    SeatReservation, bookings,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, catalog::find_flight, find_booking, ledger::load_entry, with_tx};

const REFERENCE_ATTEMPTS: usize = 8;

/// A random `RES-NNNNNN` reference.
fn new_reference() -> String {
    format!("RES-{:06}", Uuid::new_v4().as_u128() % 1_000_000)
}

fn reversal_key(booking_id: Uuid) -> String {
    format!("reversal:{booking_id}")
}

impl Engine {
    /// Creates a booking in `DRAFT`, copying the passenger data.
    pub async fn create_draft_booking(&self, cmd: NewDraftBookingCmd) -> ResultEngine<Booking> {
        if cmd.passengers.is_empty() {
            return Err(EngineError::InvalidAmount(
                "booking must have at least one passenger".to_string(),
            ));
        }
        let customer_id = normalize_required_text(&cmd.customer_id, "customer id")?;
        let agent_id = normalize_optional_text(cmd.agent_id.as_deref());
        let mut passengers = cmd.passengers;
        for passenger in &mut passengers {
            passenger.full_name = normalize_required_text(&passenger.full_name, "passenger name")?;
        }

        with_tx!(self, |db_tx| {
            find_flight(&db_tx, cmd.flight_id).await?;

            let mut attempt = 0;
            loop {
                attempt += 1;
                let booking = Booking::draft(
                    new_reference(),
                    cmd.flight_id,
                    cmd.cabin_class,
                    customer_id.clone(),
                    agent_id.clone(),
                    passengers.clone(),
                    Utc::now(),
                );
                match bookings::ActiveModel::try_from(&booking)?
                    .insert(&db_tx)
                    .await
                {
                    Ok(_) => {
                        tracing::info!("draft booking {} created", booking.reference);
                        break Ok(booking);
                    }
                    Err(err)
                        if attempt < REFERENCE_ATTEMPTS
                            && matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                    {
                        tracing::debug!("reference {} taken, retrying", booking.reference);
                    }
                    Err(err) => break Err(err.into()),
                }
            }
        })
    }

    pub async fn booking(&self, booking_id: Uuid) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| find_booking(&db_tx, booking_id).await)
    }

    pub async fn booking_by_reference(&self, reference: &str) -> ResultEngine<Booking> {
        let reference = reference.trim().to_ascii_uppercase();
        let model = bookings::Entity::find()
            .filter(bookings::Column::Reference.eq(reference.as_str()))
            .one(&self.database)
            .await?
            .ok_or(EngineError::BookingNotFound(reference))?;
        Booking::try_from(model)
    }

    /// Cancels a `DRAFT` or `AWAITING_ISSUANCE` booking.
    ///
    /// A settled booking also gets its seats back and, when a settlement
    /// entry was posted, a reversing entry that restores the agent wallet
    /// and the supplier payable.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        reason: Option<&str>,
    ) -> ResultEngine<Booking> {
        let reason = normalize_optional_text(reason);
        let now = Utc::now();
        let (booking, reversal_entry_id) =
            with_tx!(self, |db_tx| self.cancel_in(&db_tx, booking_id, reason, now).await)?;

        tracing::info!("booking {} cancelled", booking.reference);
        self.publish(BookingEvent::BookingCancelled {
            booking_id: booking.id,
            reference: booking.reference.clone(),
            reason: booking.cancel_reason.clone(),
            reversal_entry_id,
            at: now,
        });
        Ok(booking)
    }

    async fn cancel_in(
        &self,
        db_tx: &DatabaseTransaction,
        booking_id: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> ResultEngine<(Booking, Option<Uuid>)> {
        let updated = bookings::Entity::update_many()
            .col_expr(
                bookings::Column::Status,
                Expr::value(BookingStatus::Cancelled.as_str()),
            )
            .col_expr(bookings::Column::CancelledAt, Expr::value(now))
            .col_expr(bookings::Column::CancelReason, Expr::value(reason))
            .filter(bookings::Column::Id.eq(booking_id.to_string()))
            .filter(bookings::Column::Status.is_in([
                BookingStatus::Draft.as_str(),
                BookingStatus::AwaitingIssuance.as_str(),
            ]))
            .exec(db_tx)
            .await?
            .rows_affected;

        let booking = find_booking(db_tx, booking_id).await?;
        if updated == 0 {
            return Err(EngineError::InvalidTransition(format!(
                "booking {} is {}, cannot be cancelled",
                booking.reference,
                booking.status.as_str()
            )));
        }

        if booking.seats_reserved > 0 {
            self.release_seats_in(
                db_tx,
                &SeatReservation {
                    flight_id: booking.flight_id,
                    cabin_class: booking.cabin_class.unwrap_or_default(),
                    count: booking.seats_reserved,
                },
            )
            .await?;
        }

        let mut reversal_entry_id = None;
        if let Some(entry_id) = booking.journal_entry_id {
            let settlement = load_entry(db_tx, entry_id).await?;
            let reversal = settlement
                .to_new()
                .reversed(format!("Cancellation of booking {}", booking.reference), now)
                .idempotency_key(reversal_key(booking.id));
            reversal_entry_id = Some(self.post_entry_in(db_tx, &reversal).await?);
        }

        Ok((booking, reversal_entry_id))
    }
}
