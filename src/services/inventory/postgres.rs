use async_trait::async_trait;
use tracing::debug;

use super::{InventoryError, SeatInventory};
use crate::{database::Database, models::Seat};

/// Схема зала из таблицы `seats`.
#[derive(Clone)]
pub struct PgSeatInventory {
    db: Database,
}

impl PgSeatInventory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn room_exists(&self, room_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM rooms WHERE id = $1)")
            .bind(room_id)
            .fetch_one(&self.db.pool)
            .await
    }
}

#[async_trait]
impl SeatInventory for PgSeatInventory {
    async fn room_layout(&self, room_id: i64) -> Result<Vec<Seat>, InventoryError> {
        let seats = sqlx::query_as::<_, Seat>(
            r#"
            SELECT id, row_label AS "row", seat_number AS number, is_available, seat_type,
                   price::FLOAT8 AS price
            FROM seats
            WHERE room_id = $1
            ORDER BY row_label, seat_number
            "#
        )
        .bind(room_id)
        .fetch_all(&self.db.pool)
        .await?;

        // Пустой зал допустим, несуществующий нет
        if seats.is_empty() && !self.room_exists(room_id).await? {
            return Err(InventoryError::RoomNotFound(room_id));
        }

        debug!(room_id, seats = seats.len(), "Loaded room layout from database");
        Ok(seats)
    }

    async fn health_check(&self) -> bool {
        self.db.ping().await.is_ok()
    }
}
