use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub display_name: String,
    pub wins: i64,
}

/// Persistent win counts keyed by display name
#[derive(Clone)]
pub struct Leaderboard {
    pool: SqlitePool,
}

impl Leaderboard {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the player with one win, or add one to an existing count
    pub async fn increment_win(&self, display_name: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO leaderboard (display_name, wins) VALUES ($1, 1)
             ON CONFLICT(display_name) DO UPDATE SET wins = wins + 1",
        )
        .bind(display_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All players, most wins first
    pub async fn standings(&self) -> Result<Vec<Standing>, sqlx::Error> {
        sqlx::query_as::<_, Standing>(
            "SELECT display_name, wins FROM leaderboard ORDER BY wins DESC, display_name ASC",
        )
        .fetch_all(&self.pool)
        .await
    }
}
