use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Create the schema if it does not exist yet. Safe to run on every start.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Accounts (identity provider)
CREATE TABLE IF NOT EXISTS accounts (
    id            BIGSERIAL PRIMARY KEY,
    email         TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    display_name  TEXT,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_email_lower
    ON accounts (LOWER(email));

-- Saved recordings. moves is an array of {"from","to","promotion"?}.
CREATE TABLE IF NOT EXISTS recordings (
    id            BIGSERIAL PRIMARY KEY,
    owner_id      BIGINT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    moves         JSONB NOT NULL DEFAULT '[]'::jsonb,
    duration_secs BIGINT NOT NULL DEFAULT 0,
    owner_label   TEXT,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_recordings_owner_created
    ON recordings (owner_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_recordings_created
    ON recordings (created_at DESC);
"#;
