use sqlx::PgPool;

use coursehub_common::AppError;

pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_all_migrations(&self) -> Result<(), AppError> {
        tracing::info!("Starting database migrations...");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

        tracing::info!("All migrations completed successfully");
        Ok(())
    }

    pub async fn check_migration_status(&self) -> Result<MigrationStatus, AppError> {
        use sqlx::migrate::Migrate;

        let migrator = sqlx::migrate!("./migrations");
        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        conn.ensure_migrations_table()
            .await
            .map_err(|e| AppError::Internal(format!("Migration status check failed: {}", e)))?;
        let applied = conn
            .list_applied_migrations()
            .await
            .map_err(|e| AppError::Internal(format!("Migration status check failed: {}", e)))?;

        let total = migrator.migrations.len();
        let applied_count = applied.len();

        Ok(MigrationStatus {
            total,
            applied: applied_count,
            pending: total - applied_count,
        })
    }

    pub async fn seed_initial_data(&self) -> Result<(), AppError> {
        // Create admin user if it doesn't exist
        let admin_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind("admin@coursehub.dev")
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if !admin_exists {
            let admin_password = coursehub_auth::PasswordService::hash_password("Admin123!")?;

            sqlx::query(
                r#"
                INSERT INTO users (username, email, role, hashed_password)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind("admin")
            .bind("admin@coursehub.dev")
            .bind("admin")
            .bind(admin_password)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

            tracing::info!("Admin user created");
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct MigrationStatus {
    pub total: usize,
    pub applied: usize,
    pub pending: usize,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending == 0
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Migrations: {}/{} applied, {} pending",
            self.applied, self.total, self.pending
        )
    }
}
