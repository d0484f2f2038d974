use crate::errors::{AppError, ResultExt};
use crate::models::{EntryRow, SubmitRequest};
use sqlx::PgPool;

/// Columns every statement selects, in response order.
///
/// `total_income` is converted by Postgres so NaN still decodes, and
/// `benefit_images` goes through JSONB so any column type reads back as-is.
const ENTRY_COLUMNS: &str = "address, first_name, last_name, phone, email, \
     eligibility_type, income_details, total_income::float8 AS total_income, \
     benefit_description, to_jsonb(benefit_images) AS benefit_images, what_we_can_do";

/// Storage service for eligibility entries.
///
/// Each call checks one connection out of the pool for a single statement;
/// the connection goes back to the pool when it is dropped at the end of the
/// call, whichever way the call exits.
#[derive(Clone)]
pub struct EntryStorage {
    pool: PgPool,
    table: String,
}

impl EntryStorage {
    /// `table` must already be validated by `config::validate_table_name`.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Case-insensitive substring match on `address`.
    pub async fn search_by_street(&self, fragment: &str) -> Result<Vec<EntryRow>, AppError> {
        let sql = format!(
            "SELECT {}, accepted, completed FROM {} \
             WHERE address ILIKE $1 ESCAPE '\\' \
             ORDER BY address",
            ENTRY_COLUMNS, self.table
        );
        let pattern = format!("%{}%", escape_like(fragment));

        let mut conn = self
            .pool
            .acquire()
            .await
            .context("acquire connection for address search")?;

        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(pattern)
            .fetch_all(&mut *conn)
            .await
            .context("search entries by street")?;

        Ok(rows)
    }

    /// Writes a submission onto the row matching `address` and marks it accepted.
    ///
    /// Returns the number of rows touched; zero is not an error.
    pub async fn update_submission(&self, submission: SubmitRequest) -> Result<u64, AppError> {
        let income_details = submission.income_details_text()?;
        let qualifications = submission.qualifications_text()?;

        let sql = format!(
            "UPDATE {} SET \
                first_name = $1, \
                last_name = $2, \
                phone = $3, \
                email = $4, \
                eligibility_type = $5, \
                income_details = $6, \
                total_income = $7, \
                benefit_description = $8, \
                benefit_images = $9, \
                what_we_can_do = $10, \
                accepted = $11 \
             WHERE address = $12",
            self.table
        );

        let mut conn = self
            .pool
            .acquire()
            .await
            .context("acquire connection for submission")?;

        let result = sqlx::query(&sql)
            .bind(submission.first_name)
            .bind(submission.last_name)
            .bind(submission.phone)
            .bind(submission.email)
            .bind(submission.eligibility_type)
            .bind(income_details)
            .bind(submission.total_income)
            .bind(submission.benefit_description)
            .bind(submission.benefit_images.map(|images| images.into_vec()))
            .bind(qualifications)
            .bind(true)
            .bind(submission.address)
            .execute(&mut *conn)
            .await
            .context("update entry submission")?;

        Ok(result.rows_affected())
    }

    /// Exact-match lookup on `address`.
    pub async fn find_by_address(&self, address: &str) -> Result<Option<EntryRow>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE address = $1",
            ENTRY_COLUMNS, self.table
        );

        let mut conn = self
            .pool
            .acquire()
            .await
            .context("acquire connection for address lookup")?;

        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
            .context("fetch entry by address")?;

        Ok(row)
    }

    /// Rows accepted but not yet completed.
    pub async fn list_qualified(&self) -> Result<Vec<EntryRow>, AppError> {
        let sql = format!(
            "SELECT {}, accepted, completed FROM {} \
             WHERE accepted = true AND completed = false \
             ORDER BY address",
            ENTRY_COLUMNS, self.table
        );

        let mut conn = self
            .pool
            .acquire()
            .await
            .context("acquire connection for qualified entries")?;

        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .fetch_all(&mut *conn)
            .await
            .context("list qualified entries")?;

        Ok(rows)
    }
}

/// Escapes `LIKE` metacharacters so the fragment matches literally.
pub fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
