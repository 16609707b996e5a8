//! Record-store and service behaviour against the in-memory engine.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use userstore::validation::UserValidator;
use userstore::{Outcome, RequestContext, StorageEngine, User, UserService, WriteOutcome};

fn new_service() -> UserService {
    let storage = StorageEngine::open_memory("masterdata", 1).unwrap();
    UserService::new(storage, Arc::new(UserValidator))
}

fn alice() -> User {
    User::new("u1")
        .with_username("alice")
        .with_email("a@x.com")
        .with_phone("+1 555-0100")
        .with_date_of_birth(NaiveDate::from_ymd_opt(1990, 4, 2).unwrap())
}

#[tokio::test]
async fn test_bootstrap_twice_is_noop() {
    let storage = StorageEngine::open_memory("masterdata", 1).unwrap();
    let ctx = RequestContext::background();
    storage.create(&ctx, &alice()).await.unwrap();

    storage.ensure_schema(1).await.unwrap();
    storage.ensure_schema(1).await.unwrap();

    assert_eq!(storage.all(&ctx).await.unwrap(), vec![alice()]);
}

#[tokio::test]
async fn test_create_then_load_round_trips() {
    let service = new_service();
    let ctx = RequestContext::background();

    assert_eq!(service.create(&ctx, alice()).await, Outcome::Created(1));
    assert_eq!(service.load(&ctx, "u1").await, Outcome::Ok(alice()));
}

#[tokio::test]
async fn test_load_unknown_is_not_found() {
    let service = new_service();
    let ctx = RequestContext::background();
    assert_eq!(service.load(&ctx, "nobody").await, Outcome::NotFound);
}

#[tokio::test]
async fn test_update_scenario() {
    let service = new_service();
    let ctx = RequestContext::background();

    let user = User::new("u1").with_username("alice").with_email("a@x.com");
    assert_eq!(service.create(&ctx, user.clone()).await, Outcome::Created(1));
    assert_eq!(service.load(&ctx, "u1").await, Outcome::Ok(user.clone()));

    let changed = user.clone().with_email("a2@x.com");
    assert_eq!(service.update(&ctx, "u1", changed).await, Outcome::Ok(1));

    match service.load(&ctx, "u1").await {
        Outcome::Ok(stored) => {
            assert_eq!(stored.email, "a2@x.com");
            assert_eq!(stored.username, "alice");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_update_missing_creates_nothing() {
    let service = new_service();
    let ctx = RequestContext::background();

    let user = User::new("missing").with_username("ghost");
    assert_eq!(
        service.update(&ctx, "missing", user).await,
        Outcome::NotFound
    );
    assert_eq!(service.load(&ctx, "missing").await, Outcome::NotFound);
}

#[tokio::test]
async fn test_delete_then_delete_again() {
    let service = new_service();
    let ctx = RequestContext::background();
    service.create(&ctx, alice()).await;

    assert_eq!(service.delete(&ctx, "u1").await, Outcome::Ok(1));
    assert_eq!(service.load(&ctx, "u1").await, Outcome::NotFound);
    assert_eq!(service.delete(&ctx, "u1").await, Outcome::NotFound);
}

#[tokio::test]
async fn test_store_delete_counts() {
    let storage = StorageEngine::open_memory("masterdata", 1).unwrap();
    let ctx = RequestContext::background();
    storage.create(&ctx, &alice()).await.unwrap();

    assert!(storage.delete(&ctx, "u1").await.unwrap().affected() > 0);
    assert!(storage.delete(&ctx, "u1").await.unwrap().affected() <= 0);
}

#[tokio::test]
async fn test_all_returns_created_records() {
    let service = new_service();
    let ctx = RequestContext::background();

    let ids: HashSet<String> = (0..5).map(|i| format!("user-{}", i)).collect();
    for id in &ids {
        let user = User::new(id.clone()).with_username(format!("name {}", id));
        assert!(service.create(&ctx, user).await.is_ok());
    }

    match service.all(&ctx).await {
        Outcome::Ok(users) => {
            let found: HashSet<String> = users.into_iter().map(|u| u.id).collect();
            assert_eq!(found, ids);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_create_writes_nothing() {
    let service = new_service();
    let ctx = RequestContext::background();

    let user = User::new("u1").with_email("not-an-email");
    match service.create(&ctx, user).await {
        Outcome::Invalid(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "email");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(service.load(&ctx, "u1").await, Outcome::NotFound);
}

#[tokio::test]
async fn test_invalid_update_leaves_row() {
    let service = new_service();
    let ctx = RequestContext::background();
    service.create(&ctx, alice()).await;

    let bad = alice().with_phone("not a phone");
    assert!(matches!(
        service.update(&ctx, "u1", bad).await,
        Outcome::Invalid(_)
    ));
    assert_eq!(service.load(&ctx, "u1").await, Outcome::Ok(alice()));
}

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let service = new_service();
    let ctx = RequestContext::background();
    service.create(&ctx, alice()).await;

    let imposter = User::new("u1").with_username("mallory");
    assert_eq!(service.create(&ctx, imposter).await, Outcome::Conflict);
    assert_eq!(service.load(&ctx, "u1").await, Outcome::Ok(alice()));
}

#[tokio::test]
async fn test_store_failure_is_internal() {
    let storage = StorageEngine::open_memory("masterdata", 1).unwrap();
    let service = UserService::new(storage.clone(), Arc::new(UserValidator));
    let ctx = RequestContext::background();

    if let StorageEngine::Memory(adapter) = &storage {
        adapter.set_offline(true);
    }
    assert_eq!(service.all(&ctx).await, Outcome::Internal);
    assert_eq!(service.load(&ctx, "u1").await, Outcome::Internal);
    assert_eq!(service.create(&ctx, alice()).await, Outcome::Internal);
}

#[tokio::test]
async fn test_cancelled_request() {
    let service = new_service();
    let ctx = RequestContext::background();
    ctx.cancel();

    assert_eq!(service.all(&ctx).await, Outcome::Cancelled);
    assert_eq!(service.create(&ctx, alice()).await, Outcome::Cancelled);

    let fresh = RequestContext::background();
    assert_eq!(service.load(&fresh, "u1").await, Outcome::NotFound);
}

#[tokio::test]
async fn test_expired_deadline() {
    let service = new_service();
    let ctx = RequestContext::with_timeout(Duration::from_millis(1));
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(service.load(&ctx, "u1").await, Outcome::Cancelled);
}

#[tokio::test]
async fn test_concurrent_writers_share_store() {
    let service = new_service();
    let mut handles = Vec::new();
    for i in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::background();
            service.create(&ctx, User::new(format!("c{}", i))).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Outcome::Created(1));
    }

    let ctx = RequestContext::background();
    match service.all(&ctx).await {
        Outcome::Ok(users) => assert_eq!(users.len(), 16),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_write_outcomes_from_store() {
    let storage = StorageEngine::open_memory("masterdata", 1).unwrap();
    let ctx = RequestContext::background();

    assert_eq!(
        storage.update(&ctx, &alice()).await.unwrap(),
        WriteOutcome::NotFound
    );
    assert_eq!(
        storage.create(&ctx, &alice()).await.unwrap(),
        WriteOutcome::Applied
    );
    assert_eq!(
        storage.create(&ctx, &alice()).await.unwrap(),
        WriteOutcome::AlreadyExists
    );
}
