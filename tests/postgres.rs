//! Runs the SQL store against a real database. Each test gets a fresh
//! database with `migrations/` applied; point `DATABASE_URL` at a server
//! and run `cargo test -- --include-ignored`.

use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront::domain::{NewCollection, NewProduct, Price, Quantity, Slug};
use storefront::{PostgresRepository, RepositoryError, StoreRepository};
use uuid::Uuid;

async fn seeded(pool: &PgPool) -> (PostgresRepository, i64, i64) {
    let repo = PostgresRepository::new(pool.clone());
    let collection = repo
        .create_collection(NewCollection { title: "Kitchen".into(), featured_product_id: None })
        .await
        .unwrap();
    let product = repo
        .create_product(NewProduct {
            title: "Teapot".into(),
            slug: Slug::new("teapot").unwrap(),
            description: String::new(),
            price: Price::new(Decimal::new(2500, 2)).unwrap(),
            inventory: 40,
            collection_id: collection.id,
        })
        .await
        .unwrap();
    (repo, collection.id, product.id)
}

fn qty(n: u32) -> Quantity { Quantity::new(n).unwrap() }

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
async fn add_cart_item_twice_merges_into_one_row(pool: PgPool) {
    let (repo, _, product_id) = seeded(&pool).await;
    let cart = repo.create_cart().await.unwrap();

    let first = repo.add_cart_item(cart.id(), product_id, qty(2)).await.unwrap();
    let second = repo.add_cart_item(cart.id(), product_id, qty(5)).await.unwrap();
    assert!(!first.merged);
    assert!(second.merged);
    assert_eq!(first.item.id, second.item.id);
    assert_eq!(second.item.quantity.value(), 7);
    assert_eq!(second.item.product.title, "Teapot");

    let cart = repo.get_cart(cart.id()).await.unwrap().unwrap();
    assert_eq!(cart.item_count(), 1);
    assert_eq!(cart.total_price(), Decimal::new(17500, 2));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
async fn concurrent_adds_do_not_lose_quantity(pool: PgPool) {
    let (repo, _, product_id) = seeded(&pool).await;
    let repo = std::sync::Arc::new(repo);
    let cart_id = repo.create_cart().await.unwrap().id();
    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.add_cart_item(cart_id, product_id, qty(3)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    let cart = repo.get_cart(cart_id).await.unwrap().unwrap();
    assert_eq!(cart.item_count(), 1);
    assert_eq!(cart.items()[0].quantity.value(), 30);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
async fn add_cart_item_reports_which_reference_is_missing(pool: PgPool) {
    let (repo, _, product_id) = seeded(&pool).await;
    let cart = repo.create_cart().await.unwrap();

    let err = repo.add_cart_item(cart.id(), 999_999, qty(1)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::MissingReference { entity: "product" }), "{err:?}");

    let err = repo.add_cart_item(Uuid::new_v4(), product_id, qty(1)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::MissingReference { entity: "cart" }), "{err:?}");

    assert!(repo.get_cart(cart.id()).await.unwrap().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
async fn merged_quantity_saturates_at_column_maximum(pool: PgPool) {
    let (repo, _, product_id) = seeded(&pool).await;
    let cart = repo.create_cart().await.unwrap();
    repo.add_cart_item(cart.id(), product_id, qty(1)).await.unwrap();
    sqlx::query("UPDATE cart_items SET quantity = $1 WHERE cart_id = $2")
        .bind(i32::MAX - 2)
        .bind(cart.id())
        .execute(&pool)
        .await
        .unwrap();

    let merged = repo.add_cart_item(cart.id(), product_id, qty(100)).await.unwrap();
    assert_eq!(merged.item.quantity.value(), Quantity::MAX_STORED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
async fn ordered_product_and_its_collection_are_protected(pool: PgPool) {
    let (repo, collection_id, product_id) = seeded(&pool).await;
    let customer_id: i64 =
        sqlx::query_scalar("INSERT INTO customers (first_name, last_name, email) VALUES ('Ada', 'Lovelace', 'ada@example.com') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    let order_id: i64 = sqlx::query_scalar("INSERT INTO orders (customer_id) VALUES ($1) RETURNING id")
        .bind(customer_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, 1, 25.00)")
        .bind(order_id)
        .bind(product_id)
        .execute(&pool)
        .await
        .unwrap();

    let err = repo.delete_product(product_id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Protected { entity: "product", .. }), "{err:?}");
    let err = repo.delete_collection(collection_id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Protected { entity: "collection", .. }), "{err:?}");

    let ordered = repo.ordered_products().await.unwrap();
    assert_eq!(ordered.len(), 1);
    assert_eq!(ordered[0].id, product_id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
async fn featured_product_is_checked_and_cleared_on_delete(pool: PgPool) {
    let (repo, collection_id, product_id) = seeded(&pool).await;

    let err = repo
        .create_collection(NewCollection { title: "Sale".into(), featured_product_id: Some(999_999) })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::MissingReference { entity: "product" }), "{err:?}");

    let featured = NewCollection { title: "Kitchen".into(), featured_product_id: Some(product_id) };
    let updated = repo.update_collection(collection_id, featured).await.unwrap().unwrap();
    assert_eq!(updated.featured_product_id, Some(product_id));
    assert_eq!(updated.products_count, 1);

    assert!(repo.delete_product(product_id).await.unwrap());
    let collection = repo.get_collection(collection_id).await.unwrap().unwrap();
    assert_eq!(collection.featured_product_id, None);
    assert_eq!(collection.products_count, 0);
}
