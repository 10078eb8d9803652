//! Initial schema migration.
//!
//! Creates the complete schema of the settlement engine:
//!
//! - `accounts`: chart of accounts plus per-airline and per-agent sub-accounts
//! - `journal_entries`: posted double-entry headers
//! - `journal_lines`: debit/credit lines of an entry
//! - `flights`: catalog with headline pricing
//! - `seat_pools`: seats and pricing per flight and cabin class
//! - `bookings`: booking lifecycle and frozen financial snapshot

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Code,
    Name,
    AccountType,
    Category,
    BalanceMinor,
    ParentCode,
    OwnerId,
    IsSystem,
}

#[derive(Iden)]
enum JournalEntries {
    Table,
    Id,
    OccurredAt,
    Description,
    Reference,
    Kind,
    IdempotencyKey,
    CreatedBy,
}

#[derive(Iden)]
enum JournalLines {
    Table,
    Id,
    EntryId,
    Position,
    AccountCode,
    DebitMinor,
    CreditMinor,
}

#[derive(Iden)]
enum Flights {
    Table,
    Id,
    AirlineId,
    AirlineName,
    FlightNumber,
    Origin,
    Destination,
    DepartureAt,
    SellingMinor,
    CostMinor,
    AgentCommissionMinor,
}

#[derive(Iden)]
enum SeatPools {
    Table,
    FlightId,
    CabinClass,
    SeatsAvailable,
    SellingMinor,
    CostMinor,
    AgentCommissionMinor,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    Reference,
    FlightId,
    CabinClass,
    CustomerId,
    AgentId,
    Passengers,
    PaymentMethod,
    PaymentConfirmed,
    Status,
    TotalMinor,
    CostMinor,
    CommissionMinor,
    NetProfitMinor,
    SeatsReserved,
    JournalEntryId,
    Pnr,
    TicketNumber,
    CreatedAt,
    PaidAt,
    IssuedAt,
    CancelledAt,
    CancelReason,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Code)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string().not_null())
                    .col(ColumnDef::new(Accounts::Category).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::ParentCode).string())
                    .col(ColumnDef::new(Accounts::OwnerId).string())
                    .col(
                        ColumnDef::new(Accounts::IsSystem)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-parent_code")
                            .from(Accounts::Table, Accounts::ParentCode)
                            .to(Accounts::Table, Accounts::Code),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Journal entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::Reference).string())
                    .col(ColumnDef::new(JournalEntries::Kind).string().not_null())
                    .col(ColumnDef::new(JournalEntries::IdempotencyKey).string())
                    .col(ColumnDef::new(JournalEntries::CreatedBy).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-idempotency_key")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-occurred_at")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-reference")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::Reference)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Journal lines
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(JournalLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalLines::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JournalLines::EntryId).string().not_null())
                    .col(ColumnDef::new(JournalLines::Position).integer().not_null())
                    .col(ColumnDef::new(JournalLines::AccountCode).string().not_null())
                    .col(
                        ColumnDef::new(JournalLines::DebitMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalLines::CreditMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_lines-entry_id")
                            .from(JournalLines::Table, JournalLines::EntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_lines-account_code")
                            .from(JournalLines::Table, JournalLines::AccountCode)
                            .to(Accounts::Table, Accounts::Code),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_lines-entry_id-position")
                    .table(JournalLines::Table)
                    .col(JournalLines::EntryId)
                    .col(JournalLines::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_lines-account_code")
                    .table(JournalLines::Table)
                    .col(JournalLines::AccountCode)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Flights
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Flights::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Flights::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Flights::AirlineId).string().not_null())
                    .col(ColumnDef::new(Flights::AirlineName).string().not_null())
                    .col(ColumnDef::new(Flights::FlightNumber).string().not_null())
                    .col(ColumnDef::new(Flights::Origin).string().not_null())
                    .col(ColumnDef::new(Flights::Destination).string().not_null())
                    .col(ColumnDef::new(Flights::DepartureAt).timestamp().not_null())
                    .col(ColumnDef::new(Flights::SellingMinor).big_integer().not_null())
                    .col(ColumnDef::new(Flights::CostMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Flights::AgentCommissionMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Seat pools
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SeatPools::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SeatPools::FlightId).string().not_null())
                    .col(ColumnDef::new(SeatPools::CabinClass).string().not_null())
                    .col(
                        ColumnDef::new(SeatPools::SeatsAvailable)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SeatPools::SellingMinor).big_integer().not_null())
                    .col(ColumnDef::new(SeatPools::CostMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(SeatPools::AgentCommissionMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(SeatPools::FlightId)
                            .col(SeatPools::CabinClass),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-seat_pools-flight_id")
                            .from(SeatPools::Table, SeatPools::FlightId)
                            .to(Flights::Table, Flights::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Bookings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::Reference).string().not_null())
                    .col(ColumnDef::new(Bookings::FlightId).string().not_null())
                    .col(ColumnDef::new(Bookings::CabinClass).string())
                    .col(ColumnDef::new(Bookings::CustomerId).string().not_null())
                    .col(ColumnDef::new(Bookings::AgentId).string())
                    .col(ColumnDef::new(Bookings::Passengers).text().not_null())
                    .col(ColumnDef::new(Bookings::PaymentMethod).string())
                    .col(
                        ColumnDef::new(Bookings::PaymentConfirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Bookings::Status).string().not_null())
                    .col(ColumnDef::new(Bookings::TotalMinor).big_integer())
                    .col(ColumnDef::new(Bookings::CostMinor).big_integer())
                    .col(ColumnDef::new(Bookings::CommissionMinor).big_integer())
                    .col(ColumnDef::new(Bookings::NetProfitMinor).big_integer())
                    .col(
                        ColumnDef::new(Bookings::SeatsReserved)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bookings::JournalEntryId).string())
                    .col(ColumnDef::new(Bookings::Pnr).string())
                    .col(ColumnDef::new(Bookings::TicketNumber).string())
                    .col(ColumnDef::new(Bookings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::PaidAt).timestamp())
                    .col(ColumnDef::new(Bookings::IssuedAt).timestamp())
                    .col(ColumnDef::new(Bookings::CancelledAt).timestamp())
                    .col(ColumnDef::new(Bookings::CancelReason).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-flight_id")
                            .from(Bookings::Table, Bookings::FlightId)
                            .to(Flights::Table, Flights::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-journal_entry_id")
                            .from(Bookings::Table, Bookings::JournalEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-reference-unique")
                    .table(Bookings::Table)
                    .col(Bookings::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-status")
                    .table(Bookings::Table)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-paid_at")
                    .table(Bookings::Table)
                    .col(Bookings::PaidAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation (FK dependencies)
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SeatPools::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Flights::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
