use std::{fmt, str::FromStr};

use sea_orm::{
    DatabaseConnection, DatabaseTransaction, EntityTrait, TransactionTrait,
    sea_query::OnConflict,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    Booking, BookingEvent, EngineError, Extraction, IssuanceParser, ResultEngine, accounts,
    bookings,
};

mod catalog;
mod inventory;
mod issuance;
mod ledger;
mod lifecycle;
mod reports;
mod settlement;

pub use ledger::{BalanceDrift, JournalFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// An early `return`/`?` inside the block drops the transaction, which
/// rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// When the settlement journal entry is posted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingPoint {
    /// Post as part of `settle_payment`.
    #[default]
    Payment,
    /// Freeze the snapshot at payment, post on `resolve_issuance`.
    Issuance,
}

impl fmt::Display for PostingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => f.write_str("payment"),
            Self::Issuance => f.write_str("issuance"),
        }
    }
}

impl FromStr for PostingPoint {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "payment" => Ok(Self::Payment),
            "issuance" => Ok(Self::Issuance),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid posting point: {other}"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    posting_point: PostingPoint,
    parser: IssuanceParser,
    events: broadcast::Sender<BookingEvent>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn posting_point(&self) -> PostingPoint {
        self.posting_point
    }

    /// Subscribe to booking events published after each commit.
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events.subscribe()
    }

    /// Runs the issuance extraction without touching any booking.
    pub fn extract_issuance(&self, text: &str, claimed_ref: Option<&str>) -> Extraction {
        self.parser.extract(text, claimed_ref)
    }

    fn publish(&self, event: BookingEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("no event subscribers");
        }
    }

    /// Inserts the missing system accounts.
    async fn seed_chart(&self) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut inserted = 0u64;
            for account in accounts::system_chart() {
                inserted += accounts::Entity::insert(accounts::ActiveModel::from(&account))
                    .on_conflict(
                        OnConflict::column(accounts::Column::Code)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(&db_tx)
                    .await?;
            }
            if inserted > 0 {
                tracing::info!("seeded {inserted} system accounts");
            }
            Ok(())
        })
    }
}

async fn find_booking(
    db_tx: &DatabaseTransaction,
    booking_id: Uuid,
) -> ResultEngine<Booking> {
    let model = bookings::Entity::find_by_id(booking_id.to_string())
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::BookingNotFound(booking_id.to_string()))?;
    Booking::try_from(model)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    posting_point: PostingPoint,
    event_capacity: usize,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            posting_point: PostingPoint::default(),
            event_capacity: 256,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn posting_point(mut self, posting_point: PostingPoint) -> EngineBuilder {
        self.posting_point = posting_point;
        self
    }

    /// Buffer size of the event channel (minimum 1).
    pub fn event_capacity(mut self, capacity: usize) -> EngineBuilder {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Construct `Engine` and seed the chart of accounts.
    pub async fn build(self) -> ResultEngine<Engine> {
        let (events, _) = broadcast::channel(self.event_capacity);
        let engine = Engine {
            database: self.database,
            posting_point: self.posting_point,
            parser: IssuanceParser::new()?,
            events,
        };
        engine.seed_chart().await?;
        Ok(engine)
    }
}
