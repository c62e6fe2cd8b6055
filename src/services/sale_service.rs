use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::sales::{CheckoutItem, CheckoutRequest, CheckoutResponse},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
};

/// Convert a cart into a committed sale plus stock decrements.
///
/// The whole operation runs in one transaction: the sale header, every sale
/// line and every stock decrement either all commit or none do. Stock is
/// taken with a conditional `UPDATE ... WHERE stock >= qty` so two checkouts
/// racing on the last unit serialize on the row lock and exactly one passes.
pub async fn create_sale(
    pool: &DbPool,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let computed_total = verify_cart(&payload.items, payload.total)?;
    let payment_method = payload
        .payment_method
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "cash".to_string());

    let mut txn = pool.begin().await?;

    let sale_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO sales (id, customer_id, total, payment_method, status)
        VALUES ($1, $2, $3, $4, 'completed')
        "#,
    )
    .bind(sale_id)
    .bind(payload.customer_id)
    .bind(computed_total)
    .bind(&payment_method)
    .execute(&mut *txn)
    .await?;

    for item in &payload.items {
        let decremented = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $1, updated_at = NOW()
            WHERE id = $2 AND stock >= $1
            "#,
        )
        .bind(item.quantity)
        .bind(item.product_id)
        .execute(&mut *txn)
        .await?;

        if decremented.rows_affected() == 0 {
            // Either the product is gone or the stock ran out; probe to tell
            // the caller which. Returning drops the transaction and rolls
            // back everything written so far.
            let existing: Option<(String,)> =
                sqlx::query_as("SELECT name FROM products WHERE id = $1")
                    .bind(item.product_id)
                    .fetch_optional(&mut *txn)
                    .await?;
            return Err(match existing {
                Some((name,)) => AppError::InsufficientStock { product: name },
                None => AppError::ProductNotFound(item.product_id),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO sale_items (id, sale_id, product_id, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sale_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(i64::from(item.quantity) * item.unit_price)
        .execute(&mut *txn)
        .await?;
    }

    txn.commit().await?;

    tracing::info!(%sale_id, total = computed_total, lines = payload.items.len(), "sale committed");

    audit::record(
        pool,
        None,
        "checkout",
        "sales",
        serde_json::json!({ "sale_id": sale_id, "total": computed_total }),
    )
    .await;

    Ok(ApiResponse::success(
        "Sale recorded",
        CheckoutResponse { sale_id },
        Some(Meta::empty()),
    ))
}

/// Validate line items and recompute the total, rejecting a client total
/// that disagrees with the lines.
fn verify_cart(items: &[CheckoutItem], claimed_total: i64) -> Result<i64, AppError> {
    if items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut total: i64 = 0;
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(format!(
                "Invalid quantity for {}",
                item.name
            )));
        }
        if item.unit_price < 0 {
            return Err(AppError::BadRequest(format!(
                "Invalid unit price for {}",
                item.name
            )));
        }
        let subtotal = i64::from(item.quantity)
            .checked_mul(item.unit_price)
            .ok_or_else(|| AppError::BadRequest("Cart total overflows".into()))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| AppError::BadRequest("Cart total overflows".into()))?;
    }

    if total != claimed_total {
        return Err(AppError::BadRequest(
            "Total does not match line items".into(),
        ));
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, unit_price: i64) -> CheckoutItem {
        CheckoutItem {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price,
            name: "widget".into(),
        }
    }

    #[test]
    fn cart_total_is_recomputed_from_lines() {
        let items = vec![item(2, 100), item(1, 50)];
        assert_eq!(verify_cart(&items, 250).unwrap(), 250);
        assert!(matches!(
            verify_cart(&items, 300),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn empty_and_invalid_carts_are_rejected() {
        assert!(matches!(verify_cart(&[], 0), Err(AppError::BadRequest(_))));
        assert!(matches!(
            verify_cart(&[item(0, 100)], 0),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            verify_cart(&[item(1, -5)], -5),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn overflowing_cart_is_rejected() {
        let items = vec![item(i32::MAX, i64::MAX)];
        assert!(matches!(
            verify_cart(&items, i64::MAX),
            Err(AppError::BadRequest(_))
        ));
    }
}
