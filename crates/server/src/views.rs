//! Conversions between engine types and wire DTOs.

use api_types::{
    CabinClass, PaymentMethod,
    booking::{BookingStatus, BookingView, Financials, Passenger},
    flight::{Pricing, SeatPoolView},
    ledger::{AccountView, JournalEntryView, JournalLineView},
};

pub fn payment_method(method: PaymentMethod) -> engine::PaymentMethod {
    match method {
        PaymentMethod::Card => engine::PaymentMethod::Card,
        PaymentMethod::BankTransfer => engine::PaymentMethod::BankTransfer,
        PaymentMethod::AgentWallet => engine::PaymentMethod::AgentWallet,
    }
}

fn payment_method_view(method: engine::PaymentMethod) -> PaymentMethod {
    match method {
        engine::PaymentMethod::Card => PaymentMethod::Card,
        engine::PaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
        engine::PaymentMethod::AgentWallet => PaymentMethod::AgentWallet,
    }
}

pub fn cabin_class(class: CabinClass) -> engine::CabinClass {
    match class {
        CabinClass::Economy => engine::CabinClass::Economy,
        CabinClass::Business => engine::CabinClass::Business,
        CabinClass::First => engine::CabinClass::First,
    }
}

fn cabin_class_view(class: engine::CabinClass) -> CabinClass {
    match class {
        engine::CabinClass::Economy => CabinClass::Economy,
        engine::CabinClass::Business => CabinClass::Business,
        engine::CabinClass::First => CabinClass::First,
    }
}

fn status_view(status: engine::BookingStatus) -> BookingStatus {
    match status {
        engine::BookingStatus::Draft => BookingStatus::Draft,
        engine::BookingStatus::AwaitingIssuance => BookingStatus::AwaitingIssuance,
        engine::BookingStatus::Ready => BookingStatus::Ready,
        engine::BookingStatus::Cancelled => BookingStatus::Cancelled,
    }
}

pub fn passenger(passenger: Passenger) -> engine::PassengerSnapshot {
    engine::PassengerSnapshot {
        full_name: passenger.full_name,
        passport_number: passenger.passport_number,
        nationality: passenger.nationality,
        passport_expiry: passenger.passport_expiry,
    }
}

pub fn pricing(pricing: Pricing) -> engine::Pricing {
    engine::Pricing::new(
        pricing.selling_minor,
        pricing.cost_minor,
        pricing.agent_commission_minor,
    )
}

pub fn booking_view(booking: engine::Booking) -> BookingView {
    BookingView {
        id: booking.id,
        reference: booking.reference,
        flight_id: booking.flight_id,
        cabin_class: booking.cabin_class.map(cabin_class_view),
        customer_id: booking.customer_id,
        agent_id: booking.agent_id,
        passengers: booking
            .passengers
            .into_iter()
            .map(|p| Passenger {
                full_name: p.full_name,
                passport_number: p.passport_number,
                nationality: p.nationality,
                passport_expiry: p.passport_expiry,
            })
            .collect(),
        status: status_view(booking.status),
        payment_method: booking.payment_method.map(payment_method_view),
        payment_confirmed: booking.payment_confirmed,
        financials: booking.financials.map(|f| Financials {
            total_minor: f.total_minor,
            cost_minor: f.cost_minor,
            commission_minor: f.commission_minor,
            net_profit_minor: f.net_profit_minor,
        }),
        seats_reserved: booking.seats_reserved,
        journal_entry_id: booking.journal_entry_id,
        pnr: booking.pnr,
        ticket_number: booking.ticket_number,
        created_at: booking.created_at,
        paid_at: booking.paid_at,
        issued_at: booking.issued_at,
        cancelled_at: booking.cancelled_at,
        cancel_reason: booking.cancel_reason,
    }
}

pub fn seat_pool_view(pool: engine::SeatPool) -> SeatPoolView {
    SeatPoolView {
        flight_id: pool.flight_id,
        cabin_class: cabin_class_view(pool.cabin_class),
        seats_available: pool.seats_available,
        pricing: Pricing {
            selling_minor: pool.pricing.selling_minor,
            cost_minor: pool.pricing.cost_minor,
            agent_commission_minor: pool.pricing.agent_commission_minor,
        },
    }
}

pub fn account_view(account: engine::Account) -> AccountView {
    AccountView {
        code: account.code,
        name: account.name,
        account_type: account.account_type.as_str().to_string(),
        category: account.category.as_str().to_string(),
        balance_minor: account.balance_minor,
        parent_code: account.parent_code,
        owner_id: account.owner_id,
    }
}

pub fn journal_entry_view(entry: engine::JournalEntry) -> JournalEntryView {
    JournalEntryView {
        id: entry.id,
        occurred_at: entry.occurred_at,
        description: entry.description,
        reference: entry.reference,
        kind: entry.kind.as_str().to_string(),
        created_by: entry.created_by,
        lines: entry
            .lines
            .into_iter()
            .map(|l| JournalLineView {
                account_code: l.account_code,
                debit_minor: l.debit_minor,
                credit_minor: l.credit_minor,
            })
            .collect(),
    }
}
