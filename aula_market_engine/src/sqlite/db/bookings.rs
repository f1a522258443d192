use sqlx::SqliteConnection;

use crate::{db_types::Booking, traits::MarketDbError};

/// Creates a pending seat hold for the order. The seats themselves have already been taken from the event's
/// available spots by the caller.
pub async fn insert_booking(
    event_id: i64,
    user_id: i64,
    order_id: i64,
    seats: i64,
    conn: &mut SqliteConnection,
) -> Result<Booking, MarketDbError> {
    let booking: Booking = sqlx::query_as(
        r#"
            INSERT INTO bookings (event_id, user_id, order_id, seats, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *;
        "#,
    )
    .bind(event_id)
    .bind(user_id)
    .bind(order_id)
    .bind(seats)
    .fetch_one(conn)
    .await?;
    Ok(booking)
}

/// Locks in all of the order's pending seat holds.
pub async fn confirm_bookings_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Booking>, MarketDbError> {
    let bookings = sqlx::query_as(
        "UPDATE bookings SET status = 'confirmed', updated_at = CURRENT_TIMESTAMP WHERE order_id = $1 AND status = \
         'pending' RETURNING *",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(bookings)
}

/// Cancels every live seat hold for the order. The affected bookings are returned so the caller can hand their
/// seats back to the events.
pub async fn cancel_bookings_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Booking>, MarketDbError> {
    let bookings = sqlx::query_as(
        "UPDATE bookings SET status = 'cancelled', updated_at = CURRENT_TIMESTAMP WHERE order_id = $1 AND status != \
         'cancelled' RETURNING *",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(bookings)
}

pub async fn fetch_bookings_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Booking>, sqlx::Error> {
    let bookings =
        sqlx::query_as("SELECT * FROM bookings WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await?;
    Ok(bookings)
}
