use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{Booking, BookingEvent, BookingStatus, EngineError, ResultEngine, bookings};

use super::{Engine, catalog::find_flight, settlement::payer_of, with_tx};

/// Fields of a confident extraction.
struct Issued<'a> {
    reference: &'a str,
    pnr: &'a str,
    ticket_number: &'a str,
}

impl Engine {
    /// Completes a booking from a free-text staff reply, exactly once.
    ///
    /// The text goes through [`IssuanceParser`](crate::IssuanceParser)
    /// first; a reply that is not confident fails with
    /// `LowConfidenceExtraction` and changes nothing. Otherwise the booking
    /// named by the reply moves from `AWAITING_ISSUANCE` to `READY`, and the
    /// settlement entry is posted if it was deferred.
    pub async fn resolve_issuance(
        &self,
        text: &str,
        claimed_ref: Option<&str>,
    ) -> ResultEngine<Booking> {
        let extraction = self.parser.extract(text, claimed_ref);
        let (Some(reference), Some(pnr), Some(ticket_number), true) = (
            extraction.booking_ref.as_deref(),
            extraction.pnr.as_deref(),
            extraction.ticket_number.as_deref(),
            extraction.confident,
        ) else {
            let reason = extraction
                .reason
                .unwrap_or_else(|| "incomplete extraction".to_string());
            tracing::warn!("issuance reply needs review: {reason}");
            return Err(EngineError::LowConfidenceExtraction(reason));
        };

        let issued = Issued {
            reference,
            pnr,
            ticket_number,
        };
        let now = Utc::now();
        let booking = with_tx!(self, |db_tx| self.issue_in(&db_tx, &issued, now).await)?;

        tracing::info!(
            "booking {} ready: PNR {} ticket {}",
            booking.reference,
            issued.pnr,
            issued.ticket_number
        );
        self.publish(BookingEvent::IssuanceCompleted {
            booking_id: booking.id,
            reference: booking.reference.clone(),
            pnr: issued.pnr.to_string(),
            ticket_number: issued.ticket_number.to_string(),
            at: now,
        });
        Ok(booking)
    }

    async fn issue_in(
        &self,
        db_tx: &DatabaseTransaction,
        issued: &Issued<'_>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        let updated = bookings::Entity::update_many()
            .col_expr(
                bookings::Column::Status,
                Expr::value(BookingStatus::Ready.as_str()),
            )
            .col_expr(bookings::Column::Pnr, Expr::value(issued.pnr))
            .col_expr(
                bookings::Column::TicketNumber,
                Expr::value(issued.ticket_number),
            )
            .col_expr(bookings::Column::IssuedAt, Expr::value(now))
            .filter(bookings::Column::Reference.eq(issued.reference))
            .filter(bookings::Column::Status.eq(BookingStatus::AwaitingIssuance.as_str()))
            .exec(db_tx)
            .await?
            .rows_affected;

        let model = bookings::Entity::find()
            .filter(bookings::Column::Reference.eq(issued.reference))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::BookingNotFound(issued.reference.to_string()))?;
        let mut booking = Booking::try_from(model)?;
        if updated == 0 {
            return Err(EngineError::InvalidTransition(format!(
                "booking {} is {}, cannot become ready",
                booking.reference,
                booking.status.as_str()
            )));
        }

        // Deferred posting: the frozen snapshot is posted now.
        if booking.journal_entry_id.is_none()
            && let Some(snapshot) = booking.financials
        {
            let payer = payer_of(&booking)?;
            let flight = find_flight(db_tx, booking.flight_id).await?;
            let entry_id = self
                .post_settlement_in(
                    db_tx,
                    &booking,
                    &snapshot,
                    &payer,
                    &flight.airline_id,
                    "system",
                    now,
                )
                .await?;
            if let Some(entry_id) = entry_id {
                bookings::Entity::update_many()
                    .col_expr(
                        bookings::Column::JournalEntryId,
                        Expr::value(entry_id.to_string()),
                    )
                    .filter(bookings::Column::Id.eq(booking.id.to_string()))
                    .exec(db_tx)
                    .await?;
                booking.journal_entry_id = Some(entry_id);
            }
        }

        Ok(booking)
    }
}
