use async_trait::async_trait;
use proctor_core::repository::SeatRepository;
use proctor_core::seating::{AssignmentRecord, Seat};
use sqlx::PgPool;
use std::error::Error;
use tracing::info;

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: String,
    x: f64,
    y: f64,
    angle: f64,
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    requester_id: String,
    seat_id: String,
}

/// Seats and assignments in Postgres. Roster order is insertion order
/// (`seats.position`). The unique keys on `assignments` back up the
/// in-process lock when several replicas share one database.
#[derive(Clone)]
pub struct PostgresSeatRepository {
    pub pool: PgPool,
}

impl PostgresSeatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeatRepository for PostgresSeatRepository {
    async fn list_seats(&self) -> Result<Vec<Seat>, Box<dyn Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            r#"
            SELECT id, x, y, angle
            FROM seats
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Seat::new(row.id, row.x, row.y, row.angle))
            .collect())
    }

    async fn list_assignments(&self) -> Result<Vec<AssignmentRecord>, Box<dyn Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT requester_id, seat_id
            FROM assignments
            ORDER BY assigned_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| AssignmentRecord::new(row.requester_id, row.seat_id))
            .collect())
    }

    async fn append_assignment(&self, record: &AssignmentRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO assignments (requester_id, seat_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(&record.requester_id)
        .bind(&record.seat_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_seats(&self, seats: &[Seat]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        for seat in seats {
            sqlx::query(
                r#"
                INSERT INTO seats (id, x, y, angle)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&seat.id)
            .bind(seat.x)
            .bind(seat.y)
            .bind(seat.angle)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Inserted {} seats", seats.len());
        Ok(())
    }
}
