use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Booking, BookingEvent, BookingStatus, EngineError, EntryKind, FinancialSnapshot,
    NewJournalEntry, Payer, PaymentMethod, ResultEngine, SettlePaymentCmd, bookings, codes,
    settlement::{quote, settlement_lines},
};

use super::{
    Engine, PostingPoint, catalog::find_flight, find_booking, inventory::find_pool, with_tx,
};

pub(super) fn settlement_key(booking_id: Uuid) -> String {
    format!("settlement:{booking_id}")
}

/// The payer implied by how a booking was paid.
pub(super) fn payer_of(booking: &Booking) -> ResultEngine<Payer> {
    match booking.payment_method {
        Some(PaymentMethod::AgentWallet) => {
            let agent_id = booking.agent_id.clone().ok_or_else(|| {
                EngineError::InvalidAmount(
                    "agent_wallet payment requires an agent booking".to_string(),
                )
            })?;
            Ok(Payer::Agent { agent_id })
        }
        _ => Ok(Payer::Direct),
    }
}

impl Engine {
    /// Confirms the payment of a draft booking.
    ///
    /// In one transaction: claims the booking, reserves one seat per
    /// passenger, freezes the quote, posts the settlement entry (unless
    /// posting is deferred to issuance) and moves the booking to
    /// `AWAITING_ISSUANCE`. Any failure leaves seats, ledger and booking
    /// untouched.
    ///
    /// A second call for the same booking fails with `AlreadySettled`.
    pub async fn settle_payment(&self, cmd: SettlePaymentCmd) -> ResultEngine<Booking> {
        let now = Utc::now();
        let booking = with_tx!(self, |db_tx| self.settle_in(&db_tx, &cmd, now).await)?;

        let total_minor = booking
            .financials
            .map(|f| f.total_minor)
            .unwrap_or_default();
        tracing::info!(
            "booking {} settled: {total_minor} minor via {}",
            booking.reference,
            cmd.payment_method.as_str()
        );
        self.publish(BookingEvent::PaymentSettled {
            booking_id: booking.id,
            reference: booking.reference.clone(),
            payment_method: cmd.payment_method,
            total_minor,
            journal_entry_id: booking.journal_entry_id,
            at: now,
        });
        Ok(booking)
    }

    async fn settle_in(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &SettlePaymentCmd,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        // Claim first: the conditional write takes the lock and decides
        // which concurrent caller wins.
        let claimed = bookings::Entity::update_many()
            .col_expr(bookings::Column::PaymentConfirmed, Expr::value(true))
            .col_expr(
                bookings::Column::PaymentMethod,
                Expr::value(cmd.payment_method.as_str()),
            )
            .filter(bookings::Column::Id.eq(cmd.booking_id.to_string()))
            .filter(bookings::Column::Status.eq(BookingStatus::Draft.as_str()))
            .filter(bookings::Column::PaymentConfirmed.eq(false))
            .exec(db_tx)
            .await?
            .rows_affected;
        if claimed == 0 {
            return Err(claim_failure(db_tx, cmd.booking_id).await?);
        }

        let mut booking = find_booking(db_tx, cmd.booking_id).await?;
        let payer = payer_of(&booking)?;
        let flight = find_flight(db_tx, booking.flight_id).await?;

        let reservation = self
            .reserve_seats_in(
                db_tx,
                booking.flight_id,
                booking.cabin_class.unwrap_or_default(),
                booking.passenger_count(),
            )
            .await?;

        let pricing = match booking.cabin_class {
            Some(class) => find_pool(db_tx, booking.flight_id, class).await?.pricing,
            None => flight.pricing,
        };
        let snapshot = quote(
            &pricing,
            reservation.count,
            matches!(payer, Payer::Agent { .. }),
        )?;
        if let Some(signalled) = cmd.amount_minor
            && signalled != snapshot.total_minor
        {
            return Err(EngineError::InvalidAmount(format!(
                "payment of {signalled} does not match booking total {}",
                snapshot.total_minor
            )));
        }

        self.upsert_sub_account_in(
            db_tx,
            codes::SUPPLIERS,
            &flight.airline_id,
            &format!("Supplier {}", flight.airline_name),
        )
        .await?;
        if let Payer::Agent { agent_id } = &payer {
            let wallet = self
                .upsert_sub_account_in(db_tx, codes::AGENTS, agent_id, "")
                .await?;
            let needed = snapshot.total_minor - snapshot.commission_minor;
            // Deferred bookings have not hit the wallet yet but already own
            // part of it.
            let pending = unposted_wallet_spend(db_tx, agent_id).await?;
            let available = wallet.balance_minor - pending;
            if available < needed {
                return Err(EngineError::InsufficientFunds(format!(
                    "agent {agent_id} wallet has {available} available, booking needs {needed}"
                )));
            }
        }

        let journal_entry_id = match self.posting_point {
            PostingPoint::Payment => {
                self.post_settlement_in(
                    db_tx,
                    &booking,
                    &snapshot,
                    &payer,
                    &flight.airline_id,
                    &cmd.created_by,
                    now,
                )
                .await?
            }
            PostingPoint::Issuance => None,
        };

        booking.status = booking
            .status
            .transition(BookingStatus::AwaitingIssuance)?;
        booking.payment_method = Some(cmd.payment_method);
        booking.payment_confirmed = true;
        booking.financials = Some(snapshot);
        booking.seats_reserved = reservation.count;
        booking.journal_entry_id = journal_entry_id;
        booking.paid_at = Some(now);
        bookings::ActiveModel::try_from(&booking)?
            .update(db_tx)
            .await?;

        Ok(booking)
    }

    /// Posts the settlement entry of a frozen snapshot. `None` when every
    /// amount is zero and there is nothing to post.
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn post_settlement_in(
        &self,
        db_tx: &DatabaseTransaction,
        booking: &Booking,
        snapshot: &FinancialSnapshot,
        payer: &Payer,
        airline_id: &str,
        created_by: &str,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Option<Uuid>> {
        let lines = settlement_lines(snapshot, payer, airline_id);
        if lines.is_empty() {
            return Ok(None);
        }
        let entry = NewJournalEntry::new(
            EntryKind::Settlement,
            format!("Settlement of booking {}", booking.reference),
            created_by,
            occurred_at,
        )
        .reference(booking.reference.clone())
        .idempotency_key(settlement_key(booking.id))
        .lines(lines);
        self.post_entry_in(db_tx, &entry).await.map(Some)
    }
}

/// Net wallet spend of the agent's settled bookings whose entry is still
/// waiting for issuance.
async fn unposted_wallet_spend(db_tx: &DatabaseTransaction, agent_id: &str) -> ResultEngine<i64> {
    let pending = bookings::Entity::find()
        .filter(bookings::Column::AgentId.eq(agent_id))
        .filter(bookings::Column::PaymentMethod.eq(PaymentMethod::AgentWallet.as_str()))
        .filter(bookings::Column::Status.eq(BookingStatus::AwaitingIssuance.as_str()))
        .filter(bookings::Column::JournalEntryId.is_null())
        .all(db_tx)
        .await?;
    Ok(pending
        .iter()
        .map(|m| m.total_minor.unwrap_or_default() - m.commission_minor.unwrap_or_default())
        .sum())
}

/// Explains why the settlement claim matched no row.
async fn claim_failure(
    db_tx: &DatabaseTransaction,
    booking_id: Uuid,
) -> ResultEngine<EngineError> {
    let booking = find_booking(db_tx, booking_id).await?;
    Ok(match booking.status {
        BookingStatus::Cancelled => EngineError::InvalidTransition(format!(
            "booking {} is cancelled",
            booking.reference
        )),
        _ => EngineError::AlreadySettled(booking.reference),
    })
}
