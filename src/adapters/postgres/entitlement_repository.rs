//! PostgreSQL implementation of EntitlementRepository.
//!
//! Transitions run inside a transaction that holds a row lock
//! (`SELECT ... FOR UPDATE`) from read to write, so concurrent events for
//! one company serialize.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entitlement::{ApplyOutcome, EntitlementRecord, SubscriptionTerm, TermTransition};
use crate::domain::foundation::{CompanyId, DomainError, ErrorCode, Timestamp};
use crate::ports::EntitlementRepository;

const SELECT_COLUMNS: &str = "company_id, customer_ref, subscription_ref, plan_ref, period_end, \
                              last_event_at, created_at, updated_at";

/// PostgreSQL implementation of the EntitlementRepository port.
pub struct PostgresEntitlementRepository {
    pool: PgPool,
}

impl PostgresEntitlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an entitlement record.
#[derive(Debug, sqlx::FromRow)]
struct EntitlementRow {
    company_id: Uuid,
    customer_ref: String,
    subscription_ref: Option<String>,
    plan_ref: Option<String>,
    period_end: Option<DateTime<Utc>>,
    last_event_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EntitlementRow> for EntitlementRecord {
    type Error = DomainError;

    fn try_from(row: EntitlementRow) -> Result<Self, Self::Error> {
        let subscription = match (row.subscription_ref, row.period_end) {
            (Some(subscription_ref), Some(period_end)) => Some(SubscriptionTerm::new(
                subscription_ref,
                row.plan_ref,
                Timestamp::from_datetime(period_end),
            )),
            (None, None) => None,
            _ => {
                return Err(DomainError::new(
                    ErrorCode::InvariantViolated,
                    "subscription_ref and period_end must be set together",
                )
                .with_detail("company_id", row.company_id.to_string()))
            }
        };

        Ok(EntitlementRecord {
            company_id: CompanyId::from_uuid(row.company_id),
            customer_ref: row.customer_ref,
            subscription,
            last_event_at: row.last_event_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl EntitlementRepository for PostgresEntitlementRepository {
    async fn create(&self, record: &EntitlementRecord) -> Result<(), DomainError> {
        let term = record.subscription.as_ref();

        sqlx::query(
            r#"
            INSERT INTO company_entitlements (
                company_id, customer_ref, subscription_ref, plan_ref, period_end,
                last_event_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.company_id.as_uuid())
        .bind(&record.customer_ref)
        .bind(term.map(|t| t.subscription_ref.as_str()))
        .bind(term.and_then(|t| t.plan_ref.as_deref()))
        .bind(term.map(|t| *t.period_end.as_datetime()))
        .bind(record.last_event_at.map(|t| *t.as_datetime()))
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return DomainError::new(
                        ErrorCode::AlreadyExists,
                        "Entitlement record already exists",
                    )
                    .with_detail("company_id", record.company_id.to_string());
                }
            }
            db_error("create entitlement record", e)
        })?;

        Ok(())
    }

    async fn find_by_company_id(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<EntitlementRecord>, DomainError> {
        let row: Option<EntitlementRow> = sqlx::query_as(&format!(
            "SELECT {} FROM company_entitlements WHERE company_id = $1",
            SELECT_COLUMNS
        ))
        .bind(company_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find entitlement record", e))?;

        row.map(EntitlementRecord::try_from).transpose()
    }

    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<EntitlementRecord>, DomainError> {
        let row: Option<EntitlementRow> = sqlx::query_as(&format!(
            "SELECT {} FROM company_entitlements WHERE customer_ref = $1",
            SELECT_COLUMNS
        ))
        .bind(customer_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find entitlement record", e))?;

        row.map(EntitlementRecord::try_from).transpose()
    }

    async fn apply_transition(
        &self,
        customer_ref: &str,
        transition: &TermTransition,
        event_at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        let row: Option<EntitlementRow> = sqlx::query_as(&format!(
            "SELECT {} FROM company_entitlements WHERE customer_ref = $1 FOR UPDATE",
            SELECT_COLUMNS
        ))
        .bind(customer_ref)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("lock entitlement record", e))?;

        let mut record = match row {
            Some(row) => EntitlementRecord::try_from(row)?,
            None => {
                return Err(DomainError::new(
                    ErrorCode::CustomerNotFound,
                    "No entitlement record for customer",
                )
                .with_detail("customer_ref", customer_ref))
            }
        };

        let outcome = record.apply(transition, event_at);
        if !outcome.is_applied() {
            // Dropping the transaction rolls back and releases the lock.
            return Ok(outcome);
        }

        let term = record.subscription.as_ref();
        sqlx::query(
            r#"
            UPDATE company_entitlements SET
                subscription_ref = $2,
                plan_ref = $3,
                period_end = $4,
                last_event_at = $5,
                updated_at = $6
            WHERE company_id = $1
            "#,
        )
        .bind(record.company_id.as_uuid())
        .bind(term.map(|t| t.subscription_ref.as_str()))
        .bind(term.and_then(|t| t.plan_ref.as_deref()))
        .bind(term.map(|t| *t.period_end.as_datetime()))
        .bind(record.last_event_at.map(|t| *t.as_datetime()))
        .bind(record.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("update entitlement record", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit entitlement transition", e))?;

        Ok(outcome)
    }

    async fn delete(&self, company_id: &CompanyId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM company_entitlements WHERE company_id = $1")
            .bind(company_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete entitlement record", e))?;

        Ok(result.rows_affected() > 0)
    }
}
