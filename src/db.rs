use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        job_title VARCHAR(255) NOT NULL,
        email VARCHAR(255) NULL,
        phone VARCHAR(64) NULL,
        address VARCHAR(512) NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        employee_id BIGINT UNSIGNED NOT NULL,
        day DATE NOT NULL,
        status VARCHAR(16) NOT NULL,
        revision INT UNSIGNED NOT NULL DEFAULT 0,
        UNIQUE KEY uq_attendance_employee_day (employee_id, day),
        KEY idx_attendance_day (day),
        CONSTRAINT fk_attendance_employee FOREIGN KEY (employee_id)
            REFERENCES employees (id) ON DELETE CASCADE
    )
    "#,
];

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Creates the tables when missing. The unique key on `(employee_id, day)` is what the
/// attendance upsert relies on.
async fn ensure_schema(pool: &MySqlPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply schema")?;
    }
    info!("Database schema ready");
    Ok(())
}
