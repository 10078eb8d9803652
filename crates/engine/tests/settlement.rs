mod common;

use std::sync::Arc;

use engine::{
    BookingEvent, BookingStatus, CabinClass, EngineError, JournalFilter, NewDraftBookingCmd,
    PaymentMethod, PostingPoint, Pricing, SeatPoolCmd, SettlePaymentCmd, codes,
};

use common::*;

#[tokio::test]
async fn direct_customer_settlement_posts_balanced_entry() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 10).await;
    let draft = direct_draft(&engine, flight_id).await;
    assert!(draft.reference.starts_with("RES-"));

    let booking = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card).amount_minor(35_000))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::AwaitingIssuance);
    assert!(booking.payment_confirmed);
    assert!(booking.paid_at.is_some());
    assert_eq!(booking.seats_reserved, 1);
    let fin = booking.financials.unwrap();
    assert_eq!(fin.total_minor, 35_000);
    assert_eq!(fin.commission_minor, 0);
    assert_eq!(fin.net_profit_minor, 15_000);

    let entry = engine
        .journal_entry(booking.journal_entry_id.unwrap())
        .await
        .unwrap();
    assert_eq!(entry.lines.len(), 6);
    assert_eq!(entry.total_debit(), 70_000);
    assert_eq!(entry.total_credit(), 70_000);
    assert_eq!(entry.reference.as_deref(), Some(booking.reference.as_str()));

    assert_eq!(engine.account(codes::CASH).await.unwrap().balance_minor, 35_000);
    assert_eq!(engine.account(codes::SALES).await.unwrap().balance_minor, 35_000);
    assert_eq!(engine.account(codes::SYSTEM_PROFIT).await.unwrap().balance_minor, 15_000);
    assert_eq!(engine.account("2100-ms").await.unwrap().balance_minor, 20_000);
    assert_eq!(seats_left(&engine, flight_id).await, 9);
}

#[tokio::test]
async fn agent_settlement_debits_wallet_and_credits_commission() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 10).await;
    fund_agent(&engine, "agent-7", 50_000).await;
    let draft = agent_draft(&engine, flight_id, "agent-7").await;

    let booking = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::AgentWallet))
        .await
        .unwrap();

    assert_eq!(booking.financials.unwrap().commission_minor, 2_500);
    assert_eq!(engine.agent_balance("agent-7").await.unwrap(), 17_500);
    assert_eq!(engine.account(codes::AGENT_COMMISSION).await.unwrap().balance_minor, 2_500);
    assert_eq!(engine.account(codes::SYSTEM_PROFIT).await.unwrap().balance_minor, 12_500);

    let entry = engine
        .journal_entry(booking.journal_entry_id.unwrap())
        .await
        .unwrap();
    assert_eq!(entry.lines.len(), 8);
    assert_eq!(entry.total_debit(), entry.total_credit());
    let wallet_lines = entry
        .lines
        .iter()
        .filter(|l| l.account_code == "2200-agent-7")
        .count();
    assert_eq!(wallet_lines, 2);
}

#[tokio::test]
async fn second_settlement_is_already_settled() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 10).await;
    let draft = direct_draft(&engine, flight_id).await;

    engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card))
        .await
        .unwrap();
    let err = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::AlreadySettled(draft.reference.clone()));
    assert_eq!(seats_left(&engine, flight_id).await, 9);
    let entries = engine
        .journal_entries(JournalFilter {
            reference: Some(draft.reference),
            ..JournalFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn concurrent_settlements_of_one_booking_post_once() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let flight_id = flight_with_seats(&engine, 10).await;
    let draft = direct_draft(&engine, flight_id).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::BankTransfer))
                .await
        }));
    }
    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(err) => assert!(matches!(err, EngineError::AlreadySettled(_)), "{err}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(seats_left(&engine, flight_id).await, 9);
    assert_eq!(engine.account(codes::CASH).await.unwrap().balance_minor, 35_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_never_oversell() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let flight_id = flight_with_seats(&engine, 3).await;

    let mut drafts = Vec::new();
    for _ in 0..8 {
        drafts.push(direct_draft(&engine, flight_id).await);
    }

    let mut handles = Vec::new();
    for draft in &drafts {
        let engine = Arc::clone(&engine);
        let booking_id = draft.id;
        handles.push(tokio::spawn(async move {
            engine
                .settle_payment(SettlePaymentCmd::new(booking_id, PaymentMethod::Card))
                .await
        }));
    }

    let mut settled = 0;
    let mut sold_out = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => settled += 1,
            Err(EngineError::InsufficientInventory(_)) => sold_out += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
    assert_eq!(settled, 3);
    assert_eq!(sold_out, 5);
    assert_eq!(seats_left(&engine, flight_id).await, 0);

    // Losers were rolled back to a clean draft.
    let mut drafts_left = 0;
    for draft in &drafts {
        let booking = engine.booking(draft.id).await.unwrap();
        if booking.status == BookingStatus::Draft {
            assert!(!booking.payment_confirmed);
            assert!(booking.journal_entry_id.is_none());
            drafts_left += 1;
        }
    }
    assert_eq!(drafts_left, 5);
    assert_eq!(engine.account(codes::SALES).await.unwrap().balance_minor, 3 * 35_000);
}

#[tokio::test]
async fn agent_overdraft_rolls_everything_back() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 4).await;
    fund_agent(&engine, "agent-9", 10_000).await;
    let draft = agent_draft(&engine, flight_id, "agent-9").await;

    let err = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::AgentWallet))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)), "{err}");

    assert_eq!(seats_left(&engine, flight_id).await, 4);
    assert_eq!(engine.agent_balance("agent-9").await.unwrap(), 10_000);
    let booking = engine.booking(draft.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Draft);
    assert!(!booking.payment_confirmed);
    assert!(booking.financials.is_none());
    assert_eq!(engine.account(codes::SALES).await.unwrap().balance_minor, 0);

    // Topping up makes the same booking payable.
    fund_agent(&engine, "agent-9", 40_000).await;
    engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::AgentWallet))
        .await
        .unwrap();
    assert_eq!(engine.agent_balance("agent-9").await.unwrap(), 17_500);
}

#[tokio::test]
async fn settlement_validation_errors() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 4).await;

    let missing = engine
        .settle_payment(SettlePaymentCmd::new(uuid::Uuid::new_v4(), PaymentMethod::Card))
        .await
        .unwrap_err();
    assert!(matches!(missing, EngineError::BookingNotFound(_)));

    let draft = direct_draft(&engine, flight_id).await;
    let wrong_amount = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card).amount_minor(1))
        .await
        .unwrap_err();
    assert!(matches!(wrong_amount, EngineError::InvalidAmount(_)));

    let no_agent = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::AgentWallet))
        .await
        .unwrap_err();
    assert!(matches!(no_agent, EngineError::InvalidAmount(_)));

    engine.cancel_booking(draft.id, Some("changed plans")).await.unwrap();
    let cancelled = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card))
        .await
        .unwrap_err();
    assert!(matches!(cancelled, EngineError::InvalidTransition(_)));
    assert_eq!(seats_left(&engine, flight_id).await, 4);
}

#[tokio::test]
async fn cabin_class_pricing_is_used_and_multiplied() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 4).await;
    engine
        .upsert_seat_pool(
            SeatPoolCmd::new(flight_id, CabinClass::Business, 2)
                .pricing(Pricing::new(90_000, 60_000, 5_000)),
        )
        .await
        .unwrap();

    let draft = engine
        .create_draft_booking(
            NewDraftBookingCmd::new(flight_id, "cust-3")
                .cabin_class(CabinClass::Business)
                .passenger(passenger("A"))
                .passenger(passenger("B")),
        )
        .await
        .unwrap();
    let booking = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card))
        .await
        .unwrap();

    let fin = booking.financials.unwrap();
    assert_eq!(fin.total_minor, 180_000);
    assert_eq!(fin.cost_minor, 120_000);
    assert_eq!(booking.seats_reserved, 2);
    let business = engine
        .seat_pool(flight_id, CabinClass::Business)
        .await
        .unwrap();
    assert_eq!(business.seats_available, 0);
    assert_eq!(seats_left(&engine, flight_id).await, 4);
}

#[tokio::test]
async fn deferred_posting_freezes_snapshot_without_entry() {
    let (engine, _db) = engine_with_posting(PostingPoint::Issuance).await;
    let flight_id = flight_with_seats(&engine, 4).await;
    let draft = direct_draft(&engine, flight_id).await;

    let booking = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::AwaitingIssuance);
    assert!(booking.financials.is_some());
    assert!(booking.journal_entry_id.is_none());
    assert_eq!(seats_left(&engine, flight_id).await, 3);
    assert!(
        engine
            .journal_entries(JournalFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn deferred_agent_bookings_cannot_share_the_same_funds() {
    let (engine, _db) = engine_with_posting(PostingPoint::Issuance).await;
    let flight_id = flight_with_seats(&engine, 4).await;
    fund_agent(&engine, "agent-9", 50_000).await;
    let first = agent_draft(&engine, flight_id, "agent-9").await;
    let second = agent_draft(&engine, flight_id, "agent-9").await;

    let first = engine
        .settle_payment(SettlePaymentCmd::new(first.id, PaymentMethod::AgentWallet))
        .await
        .unwrap();
    assert!(first.journal_entry_id.is_none());

    // 500.00 minus the 325.00 already promised leaves 175.00.
    let err = engine
        .settle_payment(SettlePaymentCmd::new(second.id, PaymentMethod::AgentWallet))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)), "{err}");
    let second = engine.booking(second.id).await.unwrap();
    assert_eq!(second.status, BookingStatus::Draft);
    assert!(!second.payment_confirmed);
    assert_eq!(seats_left(&engine, flight_id).await, 3);

    let reply = format!("{} PNR: QWE789 TKT: 0651234567", first.reference);
    engine.resolve_issuance(&reply, None).await.unwrap();
    assert_eq!(engine.agent_balance("agent-9").await.unwrap(), 17_500);

    fund_agent(&engine, "agent-9", 15_000).await;
    engine
        .settle_payment(SettlePaymentCmd::new(second.id, PaymentMethod::AgentWallet))
        .await
        .unwrap();
    let reply = format!("{} PNR: ASD456 TKT: 0651234568", second.reference);
    engine.resolve_issuance(&reply, None).await.unwrap();
    assert_eq!(engine.agent_balance("agent-9").await.unwrap(), 0);
}

#[tokio::test]
async fn settlement_publishes_event_after_commit() {
    let (engine, _db) = engine_with_db().await;
    let mut events = engine.subscribe();
    let flight_id = flight_with_seats(&engine, 4).await;
    let draft = direct_draft(&engine, flight_id).await;

    let booking = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card))
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        BookingEvent::PaymentSettled {
            booking_id,
            total_minor,
            journal_entry_id,
            ..
        } => {
            assert_eq!(booking_id, booking.id);
            assert_eq!(total_minor, 35_000);
            assert_eq!(journal_entry_id, booking.journal_entry_id);
        }
        other => panic!("unexpected event {other:?}"),
    }
}
