mod common;

use engine::{
    BookingEvent, BookingStatus, CabinClass, EngineError, EntryKind, JournalFilter,
    NewDraftBookingCmd, PaymentMethod, SettlePaymentCmd, codes,
};

use common::*;

#[tokio::test]
async fn draft_gets_a_reference_and_passenger_copy() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 5).await;

    let draft = engine
        .create_draft_booking(
            NewDraftBookingCmd::new(flight_id, "  cust-9 ")
                .cabin_class(CabinClass::Economy)
                .passenger(passenger(" Sara Ali ").nationality("EG"))
                .passenger(passenger("Omar Ali")),
        )
        .await
        .unwrap();

    let digits = draft.reference.strip_prefix("RES-").unwrap();
    assert_eq!(digits.len(), 6);
    assert!(digits.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(draft.status, BookingStatus::Draft);
    assert_eq!(draft.customer_id, "cust-9");
    assert_eq!(draft.passenger_count(), 2);
    assert_eq!(draft.passengers[0].full_name, "Sara Ali");
    assert_eq!(draft.seats_reserved, 0);
    assert!(!draft.payment_confirmed);

    let by_ref = engine
        .booking_by_reference(&draft.reference.to_lowercase())
        .await
        .unwrap();
    assert_eq!(by_ref.id, draft.id);
    assert_eq!(by_ref.passengers, draft.passengers);
}

#[tokio::test]
async fn draft_needs_passengers_and_a_flight() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 5).await;

    let no_passengers = engine
        .create_draft_booking(NewDraftBookingCmd::new(flight_id, "cust-1"))
        .await
        .unwrap_err();
    assert!(matches!(no_passengers, EngineError::InvalidAmount(_)));

    let no_flight = engine
        .create_draft_booking(
            NewDraftBookingCmd::new(uuid::Uuid::new_v4(), "cust-1").passenger(passenger("A")),
        )
        .await
        .unwrap_err();
    assert!(matches!(no_flight, EngineError::KeyNotFound(_)));

    assert!(matches!(
        engine.booking(uuid::Uuid::new_v4()).await.unwrap_err(),
        EngineError::BookingNotFound(_)
    ));
    assert!(matches!(
        engine.booking_by_reference("RES-999999").await.unwrap_err(),
        EngineError::BookingNotFound(_)
    ));
}

#[tokio::test]
async fn cancelling_a_draft_touches_nothing_else() {
    let (engine, _db) = engine_with_db().await;
    let mut events = engine.subscribe();
    let flight_id = flight_with_seats(&engine, 5).await;
    let draft = direct_draft(&engine, flight_id).await;

    let cancelled = engine
        .cancel_booking(draft.id, Some("  customer changed plans "))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("customer changed plans"));
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(seats_left(&engine, flight_id).await, 5);

    match events.recv().await.unwrap() {
        BookingEvent::BookingCancelled {
            reversal_entry_id, ..
        } => assert!(reversal_entry_id.is_none()),
        other => panic!("unexpected event {other:?}"),
    }

    let again = engine.cancel_booking(draft.id, None).await.unwrap_err();
    assert!(matches!(again, EngineError::InvalidTransition(_)));
}

#[tokio::test]
async fn cancelling_a_settled_booking_reverses_it() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 5).await;
    fund_agent(&engine, "agent-4", 50_000).await;
    let draft = agent_draft(&engine, flight_id, "agent-4").await;
    engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::AgentWallet))
        .await
        .unwrap();
    assert_eq!(seats_left(&engine, flight_id).await, 4);

    let cancelled = engine.cancel_booking(draft.id, None).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(seats_left(&engine, flight_id).await, 5);
    assert_eq!(engine.agent_balance("agent-4").await.unwrap(), 50_000);
    for code in [
        codes::SALES,
        codes::SYSTEM_PROFIT,
        codes::PROFIT_CLEARING,
        codes::COST_OF_SALES,
        codes::AGENT_COMMISSION,
    ] {
        assert_eq!(engine.account(code).await.unwrap().balance_minor, 0, "{code}");
    }
    assert_eq!(engine.account("2100-ms").await.unwrap().balance_minor, 0);

    let reversals = engine
        .journal_entries(JournalFilter {
            kind: Some(EntryKind::Reversal),
            ..JournalFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(reversals.len(), 1);
    assert_eq!(reversals[0].reference.as_deref(), Some(draft.reference.as_str()));

    // The wallet is whole again, so the freed seat can be sold.
    let other = agent_draft(&engine, flight_id, "agent-4").await;
    engine
        .settle_payment(SettlePaymentCmd::new(other.id, PaymentMethod::AgentWallet))
        .await
        .unwrap();
}

#[tokio::test]
async fn ready_bookings_cannot_be_cancelled() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 5).await;
    let draft = direct_draft(&engine, flight_id).await;
    engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card))
        .await
        .unwrap();
    engine
        .resolve_issuance(
            &format!("{} PNR: ABC123 TKT: 0019988", draft.reference),
            None,
        )
        .await
        .unwrap();

    let err = engine.cancel_booking(draft.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)), "{err}");
    let booking = engine.booking(draft.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Ready);
    assert_eq!(seats_left(&engine, flight_id).await, 4);
}
