//! Service-level tests against an in-memory SQLite database

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;

use librarium::{
    config::AppConfig,
    error::AppError,
    models::{session::CurrentUser, CreateBook, CreateMember, Session, UpdateBook, UpdateMember},
    repository::{Repository, MIGRATOR},
    services::Services,
};

/// Open a fresh in-memory database with the schema applied. A single pooled
/// connection keeps every handle on the same database.
async fn setup() -> (Services, Repository) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    MIGRATOR.run(&pool).await.expect("migrations failed");

    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), &AppConfig::default());
    (services, repository)
}

fn session() -> Session {
    Session::new(
        CurrentUser {
            id: 1,
            username: "admin".to_string(),
            role: "admin".to_string(),
        },
        StdDuration::from_secs(3600),
    )
}

fn book(isbn: &str, title: &str, author: &str, copies: i64) -> CreateBook {
    CreateBook {
        isbn: isbn.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        total_copies: copies,
    }
}

fn member(name: &str, email: &str, phone: &str) -> CreateMember {
    CreateMember {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
    }
}

#[tokio::test]
async fn add_book_and_search_round_trip() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 3))
        .await
        .expect("add_book failed");

    let found = services.catalog.search_books("T").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].isbn, "111");
    assert_eq!(found[0].available_copies, 3);

    // Substring match over author and ISBN too, case-insensitively
    assert_eq!(services.catalog.search_books("a").await.unwrap().len(), 1);
    assert_eq!(services.catalog.search_books("11").await.unwrap().len(), 1);
    assert!(services.catalog.search_books("zzz").await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_isbn_is_rejected() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 3))
        .await
        .unwrap();

    let err = services
        .catalog
        .add_book(&session, book("111", "Other", "B", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
}

#[tokio::test]
async fn issue_sets_due_date_and_decrements_availability() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 3))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();

    let loan = services
        .circulation
        .issue_book(&session, "111", m.id)
        .await
        .unwrap();

    assert_eq!(loan.due_date - loan.issue_date, Duration::days(14));
    assert!(loan.is_open());

    let b = services.catalog.get_book("111").await.unwrap();
    assert_eq!(b.available_copies, 2);
    assert_eq!(b.total_copies, 3);
}

#[tokio::test]
async fn issue_fails_when_no_copies_available() {
    let (services, repository) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("222", "Single", "A", 1))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();

    services
        .circulation
        .issue_book(&session, "222", m.id)
        .await
        .unwrap();

    let err = services
        .circulation
        .issue_book(&session, "222", m.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)));

    // No loan row was created by the failed issue
    assert_eq!(repository.loans.count_for_book("222", false).await.unwrap(), 1);
    let b = services.catalog.get_book("222").await.unwrap();
    assert_eq!(b.available_copies, 0);
}

#[tokio::test]
async fn issue_fails_for_missing_book_or_member() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 3))
        .await
        .unwrap();

    let err = services
        .circulation
        .issue_book(&session, "999", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = services
        .circulation
        .issue_book(&session, "111", 42)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn double_return_increments_availability_once() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 3))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();

    let loan = services
        .circulation
        .issue_book(&session, "111", m.id)
        .await
        .unwrap();
    assert_eq!(services.catalog.get_book("111").await.unwrap().available_copies, 2);

    let (returned, overdue) = services
        .circulation
        .return_book(&session, loan.id)
        .await
        .unwrap();
    assert!(!overdue);
    assert!(!returned.is_open());
    assert_eq!(services.catalog.get_book("111").await.unwrap().available_copies, 3);

    let err = services
        .circulation
        .return_book(&session, loan.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyReturned(id) if id == loan.id));
    assert_eq!(services.catalog.get_book("111").await.unwrap().available_copies, 3);
}

#[tokio::test]
async fn returning_missing_loan_fails() {
    let (services, _) = setup().await;
    let session = session();

    let err = services.circulation.return_book(&session, 12345).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn return_after_due_date_reports_overdue() {
    let (services, repository) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 3))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();

    let loan = services
        .circulation
        .issue_book(&session, "111", m.id)
        .await
        .unwrap();
    assert_eq!(services.catalog.get_book("111").await.unwrap().available_copies, 2);

    // Push the due date into the past instead of waiting out the loan period
    let past_due = Utc::now() - Duration::days(3);
    sqlx::query("UPDATE loans SET due_date = ? WHERE id = ?")
        .bind(past_due)
        .bind(loan.id)
        .execute(&repository.pool)
        .await
        .unwrap();

    assert_eq!(services.circulation.overdue_loans().await.unwrap().len(), 1);

    let (_, overdue) = services
        .circulation
        .return_book(&session, loan.id)
        .await
        .unwrap();
    assert!(overdue);
    assert_eq!(services.catalog.get_book("111").await.unwrap().available_copies, 3);
}

#[tokio::test]
async fn availability_stays_within_bounds_over_issue_return_sequences() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 2))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();

    let mut open = Vec::new();
    for _ in 0..2 {
        open.push(services.circulation.issue_book(&session, "111", m.id).await.unwrap());
    }
    assert!(services.circulation.issue_book(&session, "111", m.id).await.is_err());

    for loan in open {
        services.circulation.return_book(&session, loan.id).await.unwrap();
        let b = services.catalog.get_book("111").await.unwrap();
        assert!(b.available_copies >= 0 && b.available_copies <= b.total_copies);
    }

    let b = services.catalog.get_book("111").await.unwrap();
    assert_eq!(b.available_copies, b.total_copies);
}

#[tokio::test]
async fn member_validation_gates_writes() {
    let (services, repository) = setup().await;
    let session = session();

    services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .expect("valid member rejected");

    let err = services
        .members
        .add_member(&session, member("Bob", "not-an-email", "1234567890"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = services
        .members
        .add_member(&session, member("Bob", "b@c.com", "12ab"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Neither invalid member was written
    assert_eq!(repository.members.count().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_member_email_is_rejected() {
    let (services, _) = setup().await;
    let session = session();

    services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();

    let err = services
        .members
        .add_member(&session, member("Other", "A@B.com", "1234567890"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
}

#[tokio::test]
async fn update_member_validates_changed_fields() {
    let (services, _) = setup().await;
    let session = session();

    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();

    let err = services
        .members
        .update_member(
            &session,
            m.id,
            UpdateMember {
                email: Some("broken".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let updated = services
        .members
        .update_member(
            &session,
            m.id,
            UpdateMember {
                phone: Some("+33123456789".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.phone, "+33123456789");
    assert_eq!(updated.email, "a@b.com");
}

#[tokio::test]
async fn update_book_recomputes_availability() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 3))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();
    services.circulation.issue_book(&session, "111", m.id).await.unwrap();

    // One copy is out; reducing the total below that is refused
    let err = services
        .catalog
        .update_book(
            &session,
            "111",
            UpdateBook {
                total_copies: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let updated = services
        .catalog
        .update_book(
            &session,
            "111",
            UpdateBook {
                total_copies: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.total_copies, 5);
    assert_eq!(updated.available_copies, 4);

    let err = services
        .catalog
        .update_book(&session, "nope", UpdateBook::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_is_blocked_by_loans() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 1))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();
    let loan = services
        .circulation
        .issue_book(&session, "111", m.id)
        .await
        .unwrap();

    // Open loan blocks both the book and the member
    assert!(matches!(
        services.catalog.delete_book(&session, "111").await.unwrap_err(),
        AppError::Conflict(_)
    ));
    assert!(matches!(
        services.members.delete_member(&session, m.id).await.unwrap_err(),
        AppError::Conflict(_)
    ));

    // Closed history still blocks; loan rows are permanent
    services.circulation.return_book(&session, loan.id).await.unwrap();
    assert!(matches!(
        services.catalog.delete_book(&session, "111").await.unwrap_err(),
        AppError::Conflict(_)
    ));

    // A book with no loans at all deletes fine
    services
        .catalog
        .add_book(&session, book("222", "U", "B", 1))
        .await
        .unwrap();
    services.catalog.delete_book(&session, "222").await.unwrap();
    assert!(matches!(
        services.catalog.get_book("222").await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn loan_history_is_newest_first() {
    let (services, _) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 1))
        .await
        .unwrap();
    services
        .catalog
        .add_book(&session, book("222", "U", "B", 1))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();

    let first = services.circulation.issue_book(&session, "111", m.id).await.unwrap();
    let second = services.circulation.issue_book(&session, "222", m.id).await.unwrap();

    let history = services.circulation.loans_for_member(m.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[1].id, first.id);

    let by_book = services.circulation.loans_for_book("111").await.unwrap();
    assert_eq!(by_book.len(), 1);
    assert_eq!(by_book[0].book_title, "T");
    assert_eq!(by_book[0].member_name, "Ada");

    assert!(matches!(
        services.circulation.loans_for_member(999).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn login_verifies_credentials() {
    let (services, _) = setup().await;

    services.auth.ensure_default_user().await.unwrap();
    // Idempotent on restart
    services.auth.ensure_default_user().await.unwrap();

    let session = services.auth.login("admin", "admin").await.unwrap();
    assert!(session.is_valid());
    assert_eq!(session.user().username, "admin");

    assert!(matches!(
        services.auth.login("admin", "wrong").await.unwrap_err(),
        AppError::Authentication(_)
    ));
    assert!(matches!(
        services.auth.login("nobody", "admin").await.unwrap_err(),
        AppError::Authentication(_)
    ));
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let (services, _) = setup().await;

    services.auth.ensure_default_user().await.unwrap();
    let session = services.auth.login("admin", "admin").await.unwrap();

    assert!(matches!(
        services
            .auth
            .change_password(&session, "wrong", "newpass")
            .await
            .unwrap_err(),
        AppError::Authentication(_)
    ));

    services
        .auth
        .change_password(&session, "admin", "newpass")
        .await
        .unwrap();

    assert!(services.auth.login("admin", "admin").await.is_err());
    services.auth.login("admin", "newpass").await.unwrap();
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let (services, _) = setup().await;

    let expired = Session::new(
        CurrentUser {
            id: 1,
            username: "admin".to_string(),
            role: "admin".to_string(),
        },
        StdDuration::ZERO,
    );

    let err = services
        .catalog
        .add_book(&expired, book("111", "T", "A", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
    assert!(services.catalog.search_books("T").await.unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_counts_reflect_activity() {
    let (services, repository) = setup().await;
    let session = session();

    services
        .catalog
        .add_book(&session, book("111", "T", "A", 3))
        .await
        .unwrap();
    services
        .catalog
        .add_book(&session, book("222", "U", "B", 1))
        .await
        .unwrap();
    let m = services
        .members
        .add_member(&session, member("Ada", "a@b.com", "1234567890"))
        .await
        .unwrap();
    let loan = services.circulation.issue_book(&session, "111", m.id).await.unwrap();

    sqlx::query("UPDATE loans SET due_date = ? WHERE id = ?")
        .bind(Utc::now() - Duration::days(2))
        .bind(loan.id)
        .execute(&repository.pool)
        .await
        .unwrap();

    let stats = services.stats.dashboard().await.unwrap();
    assert_eq!(stats.total_books, 2);
    assert_eq!(stats.available_copies, 3);
    assert_eq!(stats.total_members, 1);
    assert_eq!(stats.active_loans, 1);
    assert_eq!(stats.overdue_loans, 1);

    let notices = services.reminders.overdue_notices().await.unwrap();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].body.contains("Dear Ada"));
    assert!(notices[0].body.contains("Title: T"));
}
