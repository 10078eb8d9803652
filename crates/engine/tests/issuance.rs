mod common;

use std::sync::Arc;

use engine::{
    Booking, BookingEvent, BookingStatus, Engine, EngineError, JournalFilter, PaymentMethod,
    PostingPoint, SettlePaymentCmd, codes,
};

use common::*;

async fn settled_booking(engine: &Engine) -> Booking {
    let flight_id = flight_with_seats(engine, 5).await;
    let draft = direct_draft(engine, flight_id).await;
    engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::Card))
        .await
        .unwrap()
}

#[tokio::test]
async fn staff_reply_completes_the_booking() {
    let (engine, _db) = engine_with_db().await;
    let mut events = engine.subscribe();
    let settled = settled_booking(&engine).await;

    let reply = format!("Issued {} PNR: ABC123 TKT: 0019988", settled.reference);
    let booking = engine.resolve_issuance(&reply, None).await.unwrap();

    assert_eq!(booking.id, settled.id);
    assert_eq!(booking.status, BookingStatus::Ready);
    assert_eq!(booking.pnr.as_deref(), Some("ABC123"));
    assert_eq!(booking.ticket_number.as_deref(), Some("0019988"));
    assert!(booking.issued_at.is_some());
    // Posted at payment, not again.
    assert_eq!(booking.journal_entry_id, settled.journal_entry_id);
    assert_eq!(engine.account(codes::SALES).await.unwrap().balance_minor, 35_000);

    let mut saw_issuance = false;
    while let Ok(event) = events.try_recv() {
        if let BookingEvent::IssuanceCompleted { pnr, reference, .. } = event {
            assert_eq!(pnr, "ABC123");
            assert_eq!(reference, settled.reference);
            saw_issuance = true;
        }
    }
    assert!(saw_issuance);
}

#[tokio::test]
async fn claimed_reference_is_used_when_text_has_none() {
    let (engine, _db) = engine_with_db().await;
    let settled = settled_booking(&engine).await;

    let booking = engine
        .resolve_issuance(
            "تم الإصدار PNR: XYZ9K2 ticket no. ٠٧٧١٢٣٤٥٦٧٨٩٠",
            Some(&settled.reference.to_lowercase()),
        )
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Ready);
    assert_eq!(booking.pnr.as_deref(), Some("XYZ9K2"));
    assert_eq!(booking.ticket_number.as_deref(), Some("0771234567890"));
}

#[tokio::test]
async fn extraction_preview_leaves_the_booking_alone() {
    let (engine, _db) = engine_with_db().await;
    let settled = settled_booking(&engine).await;

    let reply = format!("Issued {} PNR: ABC123 TKT: 0019988", settled.reference);
    let preview = engine.extract_issuance(&reply, None);
    assert!(preview.confident, "{:?}", preview.reason);
    assert_eq!(preview.booking_ref.as_deref(), Some(settled.reference.as_str()));
    assert_eq!(preview.pnr.as_deref(), Some("ABC123"));

    let booking = engine.booking(settled.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::AwaitingIssuance);
    assert!(booking.pnr.is_none());
}

#[tokio::test]
async fn low_confidence_changes_nothing() {
    let (engine, _db) = engine_with_db().await;
    let settled = settled_booking(&engine).await;

    for reply in [
        format!("{} PNR: ABC123 ticket pending", settled.reference),
        format!("{} PNR: ABC123 TKT: 0019988 cancelled by airline", settled.reference),
        "PNR: ABC123 TKT: 0019988".to_string(),
    ] {
        let err = engine.resolve_issuance(&reply, None).await.unwrap_err();
        assert!(err.is_soft(), "{reply}: {err}");
    }

    let booking = engine.booking(settled.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::AwaitingIssuance);
    assert!(booking.pnr.is_none());
    assert!(booking.ticket_number.is_none());
}

#[tokio::test]
async fn unknown_reference_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .resolve_issuance("RES-000001 PNR: ABC123 TKT: 0019988", None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::BookingNotFound("RES-000001".to_string()));
}

#[tokio::test]
async fn draft_cannot_become_ready() {
    let (engine, _db) = engine_with_db().await;
    let flight_id = flight_with_seats(&engine, 5).await;
    let draft = direct_draft(&engine, flight_id).await;

    let reply = format!("{} PNR: ABC123 TKT: 0019988", draft.reference);
    let err = engine.resolve_issuance(&reply, None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)), "{err}");
    assert_eq!(
        engine.booking(draft.id).await.unwrap().status,
        BookingStatus::Draft
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_replies_complete_once() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let settled = settled_booking(&engine).await;
    let reply = format!("Issued {} PNR: ABC123 TKT: 0019988", settled.reference);

    let mut handles = Vec::new();
    for _ in 0..5 {
        let engine = Arc::clone(&engine);
        let reply = reply.clone();
        handles.push(tokio::spawn(
            async move { engine.resolve_issuance(&reply, None).await },
        ));
    }
    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(err) => assert!(matches!(err, EngineError::InvalidTransition(_)), "{err}"),
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test]
async fn deferred_settlement_posts_at_issuance() {
    let (engine, _db) = engine_with_posting(PostingPoint::Issuance).await;
    let flight_id = flight_with_seats(&engine, 5).await;
    fund_agent(&engine, "agent-5", 50_000).await;
    let draft = agent_draft(&engine, flight_id, "agent-5").await;
    let settled = engine
        .settle_payment(SettlePaymentCmd::new(draft.id, PaymentMethod::AgentWallet))
        .await
        .unwrap();
    assert!(settled.journal_entry_id.is_none());
    assert_eq!(engine.agent_balance("agent-5").await.unwrap(), 50_000);

    let reply = format!("{} PNR: QWE789 TKT: 0651234567", settled.reference);
    let booking = engine.resolve_issuance(&reply, None).await.unwrap();

    let entry_id = booking.journal_entry_id.unwrap();
    let entry = engine.journal_entry(entry_id).await.unwrap();
    assert_eq!(entry.total_debit(), entry.total_credit());
    assert_eq!(engine.agent_balance("agent-5").await.unwrap(), 17_500);
    assert_eq!(
        engine.booking(settled.id).await.unwrap().journal_entry_id,
        Some(entry_id)
    );
    assert_eq!(
        engine
            .journal_entries(JournalFilter {
                reference: Some(settled.reference),
                ..JournalFilter::default()
            })
            .await
            .unwrap()
            .len(),
        1
    );
}
