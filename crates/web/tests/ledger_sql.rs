//! Database tests for the ticket ledger, event edits and status passes.
//!
//! These tests require a `PostgreSQL` database at `FOODIEVENT_DATABASE_URL`.
//! Migrations are applied on connect, and every test creates its own users
//! and uniquely titled events, so they can share one database.
//!
//! Run with: `cargo test -p foodievent-web --test ledger_sql -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;
use uuid::Uuid;

use foodievent_core::validation::EventDraft;
use foodievent_core::{
    Email, EventCategory, EventId, EventStatus, LedgerError, Price, TicketStatus, UserId,
};
use foodievent_web::db::users::NewUser;
use foodievent_web::db::{EventRepository, OrderRepository, StatusRepository, UserRepository};
use foodievent_web::models::Event;
use foodievent_web::routes::views::event_input;
use foodievent_web::services::{
    EventAction, EventError, EventService, LifecycleChange, TicketError, TicketService,
};

/// Status passes see every row, so they must not run against each other.
static STATUS_PASSES: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

async fn connect(max_connections: u32) -> PgPool {
    let url = std::env::var("FOODIEVENT_DATABASE_URL")
        .expect("FOODIEVENT_DATABASE_URL must be set for database tests");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn brisbane() -> FixedOffset {
    FixedOffset::east_opt(10 * 3600).unwrap()
}

fn upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("fv-ledger-{}", Uuid::new_v4().simple()))
}

async fn user(pool: &PgPool) -> UserId {
    let tag = Uuid::new_v4().simple().to_string();
    let email = Email::parse(&format!("diner.{tag}@example.com")).unwrap();
    let phone = format!("04{:08}", Uuid::new_v4().as_u128() % 100_000_000);
    UserRepository::new(pool)
        .create(&NewUser {
            first_name: "Ana",
            surname: "Lima",
            email: &email,
            phone: &phone,
            address: "12 Boundary Street",
            password_hash: "$argon2id$unused",
        })
        .await
        .unwrap()
        .id
}

async fn event(
    pool: &PgPool,
    creator: UserId,
    tickets: i32,
    price: &str,
    now: DateTime<Utc>,
) -> Event {
    let draft = EventDraft {
        title: format!("Taco Night {}", Uuid::new_v4().simple()),
        description: "Street tacos and cold drinks by the river.".to_string(),
        start_time: now + chrono::Duration::days(2),
        end_time: now + chrono::Duration::days(2) + chrono::Duration::hours(3),
        venue: "Eat Street, Brisbane".to_string(),
        vendor_names: "Taco Bros, Dumpling House".to_string(),
        total_tickets: tickets,
        ticket_price: Price::parse(price).unwrap(),
        category: EventCategory::Food,
        free_sampling: true,
        provide_takeaway: false,
    };

    let id = {
        let mut conn = pool.acquire().await.unwrap();
        EventRepository::create(&mut conn, &draft, "/static/img/tacos.png", creator, now)
            .await
            .unwrap()
    };
    stored(pool, id).await
}

async fn stored(pool: &PgPool, id: EventId) -> Event {
    EventRepository::new(pool).get_by_id(id).await.unwrap().unwrap()
}

// ============================================================================
// Title uniqueness
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at FOODIEVENT_DATABASE_URL"]
async fn test_title_taken_ignores_case_and_the_edited_event() {
    let pool = connect(5).await;
    let now = Utc::now();
    let creator = user(&pool).await;
    let taco = event(&pool, creator, 10, "10", now).await;

    let mut conn = pool.acquire().await.unwrap();
    let shouted = taco.title.to_uppercase();
    assert!(EventRepository::title_taken(&mut conn, &shouted, None).await.unwrap());
    assert!(!EventRepository::title_taken(&mut conn, &shouted, Some(taco.id)).await.unwrap());
    assert!(
        !EventRepository::title_taken(&mut conn, &format!("{} Encore", taco.title), None)
            .await
            .unwrap()
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at FOODIEVENT_DATABASE_URL"]
async fn test_update_keeps_own_title_but_not_another_events() {
    let pool = connect(5).await;
    let now = Utc::now();
    let creator = user(&pool).await;
    let taco = event(&pool, creator, 10, "10", now).await;
    let dumpling = event(&pool, creator, 10, "10", now).await;
    let dir = upload_dir();
    let service = EventService::new(&pool, &dir);

    let own = event_input(&taco, brisbane());
    let saved = service
        .update(taco.id, creator, &own, None, EventAction::Save, now, brisbane())
        .await
        .unwrap();
    assert_eq!(saved.change, LifecycleChange::None);

    let mut clash = event_input(&dumpling, brisbane());
    clash.title = taco.title.to_lowercase();
    match service
        .update(dumpling.id, creator, &clash, None, EventAction::Save, now, brisbane())
        .await
    {
        Err(EventError::Validation(errors)) => assert!(errors.has("title")),
        other => panic!("expected a title error, got {other:?}"),
    }
    assert_eq!(stored(&pool, dumpling.id).await.title, dumpling.title);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at FOODIEVENT_DATABASE_URL"]
async fn test_update_needs_only_one_connection() {
    let pool = connect(1).await;
    let now = Utc::now();
    let creator = user(&pool).await;
    let taco = event(&pool, creator, 10, "10", now).await;
    let dir = upload_dir();

    let input = event_input(&taco, brisbane());
    let result = EventService::new(&pool, &dir)
        .update(taco.id, creator, &input, None, EventAction::Save, now, brisbane())
        .await;
    assert!(result.is_ok(), "update failed: {result:?}");
}

// ============================================================================
// Purchases
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at FOODIEVENT_DATABASE_URL"]
async fn test_take_tickets_floors_at_zero_and_sells_out() {
    let pool = connect(5).await;
    let now = Utc::now();
    let creator = user(&pool).await;
    let taco = event(&pool, creator, 10, "10", now).await;
    let mut conn = pool.acquire().await.unwrap();

    assert_eq!(EventRepository::take_tickets(&mut conn, taco.id, 4, now).await.unwrap(), Some(6));
    assert_eq!(stored(&pool, taco.id).await.status, EventStatus::Open);

    assert_eq!(EventRepository::take_tickets(&mut conn, taco.id, 7, now).await.unwrap(), None);
    assert_eq!(stored(&pool, taco.id).await.total_tickets, 6);

    let later = now + chrono::Duration::minutes(5);
    assert_eq!(EventRepository::take_tickets(&mut conn, taco.id, 6, later).await.unwrap(), Some(0));
    let sold_out = stored(&pool, taco.id).await;
    assert_eq!(sold_out.total_tickets, 0);
    assert_eq!(sold_out.status, EventStatus::Soldout);
    assert_eq!(sold_out.status_date.timestamp(), later.timestamp());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at FOODIEVENT_DATABASE_URL"]
async fn test_purchase_sells_out_then_refuses() {
    let pool = connect(5).await;
    let now = Utc::now();
    let creator = user(&pool).await;
    let buyer = user(&pool).await;
    let taco = event(&pool, creator, 10, "12.50", now).await;
    let tickets = TicketService::new(&pool);

    match tickets.purchase(buyer, taco.id, 11, now).await {
        Err(TicketError::Ledger(LedgerError::InsufficientInventory { remaining, .. })) => {
            assert_eq!(remaining, 10);
        }
        other => panic!("expected a refusal, got {other:?}"),
    }
    assert_eq!(stored(&pool, taco.id).await.total_tickets, 10);

    let purchase = tickets.purchase(buyer, taco.id, 10, now).await.unwrap();
    assert_eq!(purchase.remaining, 0);
    assert_eq!(purchase.order.purchased_amount, Price::parse("125").unwrap());
    assert_eq!(purchase.order.ticket_status, TicketStatus::Active);
    assert_eq!(stored(&pool, taco.id).await.status, EventStatus::Soldout);

    assert!(matches!(
        tickets.purchase(buyer, taco.id, 1, now).await,
        Err(TicketError::Ledger(_))
    ));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at FOODIEVENT_DATABASE_URL"]
async fn test_cancel_event_refunds_active_orders_once() {
    let pool = connect(5).await;
    let now = Utc::now();
    let creator = user(&pool).await;
    let first = user(&pool).await;
    let second = user(&pool).await;
    let taco = event(&pool, creator, 20, "10", now).await;
    let tickets = TicketService::new(&pool);

    tickets.purchase(first, taco.id, 3, now).await.unwrap();
    tickets.purchase(second, taco.id, 5, now).await.unwrap();

    let dir = upload_dir();
    let service = EventService::new(&pool, &dir);
    let input = event_input(&stored(&pool, taco.id).await, brisbane());
    let cancelled = service
        .update(taco.id, creator, &input, None, EventAction::Cancel, now, brisbane())
        .await
        .unwrap();

    let LifecycleChange::Cancelled(summary) = &cancelled.change else {
        panic!("expected a cancellation, got {:?}", cancelled.change);
    };
    assert_eq!(summary.tickets_to_return, 8);
    assert_eq!(summary.total_refund, Price::parse("80").unwrap());
    assert_eq!(summary.order_ids.len(), 2);

    let after = stored(&pool, taco.id).await;
    assert_eq!(after.total_tickets, 20);
    assert_eq!(after.status, EventStatus::Cancelled);

    let orders = OrderRepository::new(&pool);
    for buyer in [first, second] {
        let bookings = orders.bookings_for_user(buyer).await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].order.ticket_status, TicketStatus::Cancelled);
    }

    let input = event_input(&after, brisbane());
    let again = service
        .update(taco.id, creator, &input, None, EventAction::Cancel, now, brisbane())
        .await
        .unwrap();
    assert_eq!(again.change, LifecycleChange::AlreadyCancelled);
    assert_eq!(stored(&pool, taco.id).await.total_tickets, 20);
}

// ============================================================================
// Status passes
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at FOODIEVENT_DATABASE_URL"]
async fn test_status_pass_does_not_wait_on_locked_rows() {
    let _serial = STATUS_PASSES.lock().await;
    let pool = connect(5).await;
    let now = Utc::now();
    let creator = user(&pool).await;
    let taco = event(&pool, creator, 10, "10", now).await;

    let mut held = pool.begin().await.unwrap();
    EventRepository::lock(&mut held, taco.id).await.unwrap();

    let statuses = StatusRepository::new(&pool);
    let preview = tokio::time::timeout(Duration::from_secs(3), statuses.preview(now)).await;
    assert!(matches!(preview, Ok(Ok(_))), "preview waited on a locked row");

    let pass = tokio::time::timeout(Duration::from_secs(3), statuses.refresh_all(now)).await;
    assert!(matches!(pass, Ok(Ok(_))), "refresh waited on a locked row");

    held.rollback().await.unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at FOODIEVENT_DATABASE_URL"]
async fn test_status_pass_closes_ended_events_and_their_orders() {
    let _serial = STATUS_PASSES.lock().await;
    let pool = connect(5).await;
    let now = Utc::now();
    let creator = user(&pool).await;
    let buyer = user(&pool).await;
    let taco = event(&pool, creator, 10, "10", now).await;
    let order = TicketService::new(&pool)
        .purchase(buyer, taco.id, 2, now)
        .await
        .unwrap()
        .order;

    let after_end = taco.end_time + chrono::Duration::minutes(1);
    let statuses = StatusRepository::new(&pool);

    let preview = statuses.preview(after_end).await.unwrap();
    assert!(preview.events_changed.contains(&taco.id));
    assert_eq!(stored(&pool, taco.id).await.status, EventStatus::Open);

    let report = statuses.refresh_all(after_end).await.unwrap();
    assert!(report.events_changed.contains(&taco.id));
    assert!(report.tickets_changed.contains(&order.id));
    assert_eq!(stored(&pool, taco.id).await.status, EventStatus::Inactive);

    let again = statuses.refresh_all(after_end).await.unwrap();
    assert!(!again.events_changed.contains(&taco.id));
    assert!(!again.tickets_changed.contains(&order.id));
}
