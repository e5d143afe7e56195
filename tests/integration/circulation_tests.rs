//! Circulation engine behavior over the in-memory store

mod common;

use chrono::Duration;
use rust_decimal::Decimal;

use common::{book_request, dec, start_date, Library};
use std::sync::Arc;

use lexora_server::{
    config::CirculationConfig,
    error::{AppError, Entity, RejectReason},
    models::{
        borrowing::BorrowingQuery,
        member::MemberRequest,
        report::{Availability, FineQuery, FineStatus, InventoryQuery, InventorySummary, PageQuery},
        BorrowingStatus, MemberStatus,
    },
    services::{NoReservations, Requester, Services},
};

fn assert_rejected<T: std::fmt::Debug>(result: Result<T, AppError>, expected: RejectReason) {
    match result {
        Err(AppError::Rejected(reason)) => assert_eq!(reason, expected),
        other => panic!("expected Rejected({:?}), got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_issue_decrements_available_copies() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 3).await;

    let loan = library
        .services()
        .circulation
        .issue(member.id, book.id)
        .await
        .unwrap();

    assert_eq!(loan.status, BorrowingStatus::Issued);
    assert_eq!(loan.issue_date, start_date());
    assert_eq!(loan.due_date, loan.issue_date + Duration::days(14));
    assert_eq!(loan.renewal_count, 0);
    assert_eq!(loan.fine_amount, Decimal::ZERO);
    assert!(loan.return_date.is_none());
    assert_eq!(library.available_copies(book.id).await, 2);
    library.assert_availability_invariant().await;
}

#[tokio::test]
async fn test_member_with_overdue_loan_cannot_borrow() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let first = library.book("Dune", 1).await;
    let second = library.book("Emma", 1).await;
    let circulation = &library.services().circulation;

    circulation.issue(member.id, first.id).await.unwrap();
    // due date is now yesterday
    library.clock.advance(15);

    assert_rejected(
        circulation.issue(member.id, second.id).await,
        RejectReason::MemberHasOverdue,
    );
    assert_eq!(library.available_copies(second.id).await, 1);
}

#[tokio::test]
async fn test_late_return_charges_fine() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 2).await;
    let circulation = &library.services().circulation;

    let loan = circulation.issue(member.id, book.id).await.unwrap();
    assert_eq!(library.available_copies(book.id).await, 1);

    library.clock.advance(24);
    let returned = circulation.return_loan(loan.id).await.unwrap();

    assert_eq!(returned.status, BorrowingStatus::Returned);
    assert_eq!(returned.return_date, Some(start_date() + Duration::days(24)));
    assert_eq!(returned.fine_amount, dec("5.00"));
    assert_eq!(library.available_copies(book.id).await, 2);
    library.assert_availability_invariant().await;
}

#[tokio::test]
async fn test_on_time_return_has_no_fine() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;
    let circulation = &library.services().circulation;

    let loan = circulation.issue(member.id, book.id).await.unwrap();
    library.clock.advance(14);

    let returned = circulation.return_loan(loan.id).await.unwrap();
    assert_eq!(returned.fine_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_overpayment_rejected_then_exact_payment_clears_fine() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;
    let circulation = &library.services().circulation;

    let loan = circulation.issue(member.id, book.id).await.unwrap();
    library.clock.advance(24);
    circulation.return_loan(loan.id).await.unwrap();

    assert_rejected(
        circulation
            .pay_fine(loan.id, dec("6.00"), Requester::Staff)
            .await,
        RejectReason::AmountExceedsFine,
    );

    let paid = circulation
        .pay_fine(loan.id, dec("5.00"), Requester::Staff)
        .await
        .unwrap();
    assert_eq!(paid.fine_amount, dec("0.00"));
}

#[tokio::test]
async fn test_partial_payments_reach_exactly_zero() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;
    let circulation = &library.services().circulation;

    let loan = circulation.issue(member.id, book.id).await.unwrap();
    library.clock.advance(24);
    circulation.return_loan(loan.id).await.unwrap();

    let mut previous = dec("5.00");
    for amount in ["1.25", "0.01", "2.49", "1.25"] {
        let paid = circulation
            .pay_fine(loan.id, dec(amount), Requester::Member(member.id))
            .await
            .unwrap();
        assert!(paid.fine_amount < previous);
        previous = paid.fine_amount;
    }
    assert_eq!(previous, Decimal::ZERO);

    assert_rejected(
        circulation
            .pay_fine(loan.id, dec("0.01"), Requester::Staff)
            .await,
        RejectReason::AmountExceedsFine,
    );
}

#[tokio::test]
async fn test_double_issue_rejected() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 3).await;
    let circulation = &library.services().circulation;

    circulation.issue(member.id, book.id).await.unwrap();
    assert_rejected(
        circulation.issue(member.id, book.id).await,
        RejectReason::DuplicateLoan,
    );
    assert_eq!(library.available_copies(book.id).await, 2);

    // After return the pair may borrow again
    let open = circulation
        .find_open_loan(member.id, book.id)
        .await
        .unwrap()
        .unwrap();
    circulation.return_loan(open.id).await.unwrap();
    assert!(circulation
        .find_open_loan(member.id, book.id)
        .await
        .unwrap()
        .is_none());
    circulation.issue(member.id, book.id).await.unwrap();
}

#[tokio::test]
async fn test_renewal_cap() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;
    let circulation = &library.services().circulation;

    let loan = circulation.issue(member.id, book.id).await.unwrap();

    let first = circulation.renew(loan.id, Requester::Staff).await.unwrap();
    assert_eq!(first.renewal_count, 1);
    assert_eq!(first.due_date, loan.due_date + Duration::days(14));

    let second = circulation
        .renew(loan.id, Requester::Member(member.id))
        .await
        .unwrap();
    assert_eq!(second.renewal_count, 2);
    assert_eq!(second.due_date, loan.due_date + Duration::days(28));

    assert_rejected(
        circulation.renew(loan.id, Requester::Staff).await,
        RejectReason::RenewalLimitExceeded,
    );
}

#[tokio::test]
async fn test_overdue_loan_cannot_be_renewed() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;
    let circulation = &library.services().circulation;

    let loan = circulation.issue(member.id, book.id).await.unwrap();
    library.clock.advance(15);

    assert_rejected(
        circulation.renew(loan.id, Requester::Staff).await,
        RejectReason::CannotRenewOverdue,
    );
}

#[tokio::test]
async fn test_returned_loan_cannot_be_renewed() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;
    let circulation = &library.services().circulation;

    let loan = circulation.issue(member.id, book.id).await.unwrap();
    circulation.return_loan(loan.id).await.unwrap();

    assert_rejected(
        circulation.renew(loan.id, Requester::Staff).await,
        RejectReason::NotIssued,
    );
}

#[tokio::test]
async fn test_return_twice() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;
    let circulation = &library.services().circulation;

    let loan = circulation.issue(member.id, book.id).await.unwrap();
    circulation.return_loan(loan.id).await.unwrap();

    assert_rejected(
        circulation.return_loan(loan.id).await,
        RejectReason::AlreadyReturned,
    );
    assert_eq!(library.available_copies(book.id).await, 1);
    library.assert_availability_invariant().await;
}

#[tokio::test]
async fn test_unknown_records_are_not_found() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let circulation = &library.services().circulation;

    assert!(matches!(
        circulation.issue(999, 1).await,
        Err(AppError::NotFound(Entity::Member, 999))
    ));
    assert!(matches!(
        circulation.issue(member.id, 999).await,
        Err(AppError::NotFound(Entity::Book, 999))
    ));
    assert!(matches!(
        circulation.return_loan(42).await,
        Err(AppError::NotFound(Entity::Borrowing, 42))
    ));
    assert!(matches!(
        circulation.pay_fine(42, dec("1.00"), Requester::Staff).await,
        Err(AppError::NotFound(..))
    ));
}

#[tokio::test]
async fn test_suspended_member_can_return_and_pay_but_not_borrow() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 2).await;
    let services = library.services();

    let loan = services.circulation.issue(member.id, book.id).await.unwrap();
    services.members.suspend(member.id).await.unwrap();

    assert_rejected(
        services.circulation.issue(member.id, book.id).await,
        RejectReason::MemberSuspended,
    );

    library.clock.advance(16);
    let returned = services.circulation.return_loan(loan.id).await.unwrap();
    assert_eq!(returned.fine_amount, dec("1.00"));

    let paid = services
        .circulation
        .pay_fine(loan.id, dec("1.00"), Requester::Member(member.id))
        .await
        .unwrap();
    assert!(paid.fine_amount.is_zero());
}

#[tokio::test]
async fn test_member_limit() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let circulation = &library.services().circulation;

    for i in 0..5 {
        let book = library.book(&format!("Volume {}", i), 1).await;
        circulation.issue(member.id, book.id).await.unwrap();
    }

    let sixth = library.book("Volume 6", 1).await;
    assert_rejected(
        circulation.issue(member.id, sixth.id).await,
        RejectReason::MemberLimitExceeded,
    );
    assert_eq!(library.available_copies(sixth.id).await, 1);
}

#[tokio::test]
async fn test_issue_checks_run_in_order() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;
    let circulation = &library.services().circulation;

    circulation.issue(member.id, book.id).await.unwrap();
    library.clock.advance(30);
    library.services().members.suspend(member.id).await.unwrap();

    // Suspension is reported before the overdue loan, the overdue loan before the missing book
    assert_rejected(
        circulation.issue(member.id, 999).await,
        RejectReason::MemberSuspended,
    );
    library.services().members.activate(member.id).await.unwrap();
    assert_rejected(
        circulation.issue(member.id, 999).await,
        RejectReason::MemberHasOverdue,
    );

    // The only copy is still out
    let other = library.member("Grace Hopper").await;
    let loan = circulation.issue(other.id, book.id).await;
    assert_rejected(loan, RejectReason::BookUnavailable);
}

#[tokio::test]
async fn test_last_copy_goes_to_exactly_one_caller() {
    let library = Library::new();
    let book = library.book("Dune", 1).await;
    let mut members = Vec::new();
    for i in 0..8 {
        members.push(library.member(&format!("Member {}", i)).await);
    }

    let mut handles = Vec::new();
    for member in &members {
        let circulation = library.services().circulation.clone();
        let (member_id, book_id) = (member.id, book.id);
        handles.push(tokio::spawn(async move {
            circulation.issue(member_id, book_id).await
        }));
    }

    let mut issued = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => issued += 1,
            Err(AppError::Rejected(RejectReason::BookUnavailable)) => {}
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    assert_eq!(issued, 1);
    assert_eq!(library.available_copies(book.id).await, 0);
    library.assert_availability_invariant().await;
}

#[tokio::test]
async fn test_store_outage_is_transient_and_changes_nothing() {
    let library = Library::new();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;

    library.store.set_available(false);
    let err = library
        .services()
        .circulation
        .issue(member.id, book.id)
        .await
        .unwrap_err();
    assert!(err.is_transient());

    library.store.set_available(true);
    assert_eq!(library.available_copies(book.id).await, 1);
    assert!(library.snapshot().await.borrowings.is_empty());
}

#[tokio::test]
async fn test_availability_invariant_over_mixed_activity() {
    let library = Library::new();
    let circulation = &library.services().circulation;
    let alice = library.member("Alice").await;
    let bob = library.member("Bob").await;
    let dune = library.book("Dune", 2).await;
    let emma = library.book("Emma", 1).await;

    let a1 = circulation.issue(alice.id, dune.id).await.unwrap();
    library.assert_availability_invariant().await;
    circulation.issue(bob.id, dune.id).await.unwrap();
    library.assert_availability_invariant().await;
    circulation.issue(alice.id, emma.id).await.unwrap();
    assert_rejected(
        circulation.issue(bob.id, emma.id).await,
        RejectReason::BookUnavailable,
    );
    library.assert_availability_invariant().await;
    circulation.return_loan(a1.id).await.unwrap();
    library.assert_availability_invariant().await;

    // Catalog edits keep the invariant too
    library
        .services()
        .catalog
        .update(dune.id, book_request("Dune", 4))
        .await
        .unwrap();
    library.assert_availability_invariant().await;
    assert_eq!(library.available_copies(dune.id).await, 3);
}

#[tokio::test]
async fn test_member_sees_only_own_borrowings() {
    let library = Library::new();
    let circulation = &library.services().circulation;
    let alice = library.member("Alice").await;
    let bob = library.member("Bob").await;
    let book = library.book("Dune", 2).await;

    let alice_loan = circulation.issue(alice.id, book.id).await.unwrap();
    circulation.issue(bob.id, book.id).await.unwrap();

    let own = circulation
        .list(BorrowingQuery::default(), Requester::Member(alice.id))
        .await
        .unwrap();
    assert_eq!(own.total, 1);
    assert_eq!(own.items[0].borrowing.id, alice_loan.id);

    let all = circulation
        .list(BorrowingQuery::default(), Requester::Staff)
        .await
        .unwrap();
    assert_eq!(all.total, 2);

    let spying = circulation
        .list(
            BorrowingQuery {
                member_id: Some(bob.id),
                ..Default::default()
            },
            Requester::Member(alice.id),
        )
        .await;
    assert!(matches!(spying, Err(AppError::Authorization(_))));
    assert!(matches!(
        circulation.get(alice_loan.id, Requester::Member(bob.id)).await,
        Err(AppError::Authorization(_))
    ));
}

#[tokio::test]
async fn test_member_admin_guards() {
    let library = Library::new();
    let services = library.services();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;

    let loan = services.circulation.issue(member.id, book.id).await.unwrap();
    assert_rejected(
        services.members.delete(member.id).await,
        RejectReason::MemberHasOpenLoans,
    );

    library.clock.advance(20);
    services.circulation.return_loan(loan.id).await.unwrap();
    assert_rejected(
        services.members.delete(member.id).await,
        RejectReason::MemberHasOutstandingFines,
    );

    let details = services.members.get(member.id).await.unwrap();
    assert_eq!(details.active_loans, 0);
    assert_eq!(details.outstanding_fines, dec("3.00"));

    let stats = services.members.stats(member.id).await.unwrap();
    assert_eq!(stats.total_borrows, 1);
    assert_eq!(stats.overdue_books, 0);

    services
        .circulation
        .pay_fine(loan.id, dec("3.00"), Requester::Staff)
        .await
        .unwrap();
    services.members.delete(member.id).await.unwrap();

    assert!(matches!(
        services.members.get(member.id).await,
        Err(AppError::NotFound(..))
    ));
    assert!(library.snapshot().await.borrowings.is_empty());
}

#[tokio::test]
async fn test_suspend_and_activate_are_idempotent() {
    let library = Library::new();
    let members = &library.services().members;
    let member = library.member("Ada Lovelace").await;

    assert_eq!(members.suspend(member.id).await.unwrap().status, MemberStatus::Suspended);
    assert_eq!(members.suspend(member.id).await.unwrap().status, MemberStatus::Suspended);
    assert_eq!(members.activate(member.id).await.unwrap().status, MemberStatus::Active);
    assert_eq!(members.activate(member.id).await.unwrap().status, MemberStatus::Active);
}

#[tokio::test]
async fn test_duplicate_email_and_isbn_conflict() {
    let library = Library::new();
    let services = library.services();

    let request = MemberRequest {
        full_name: "Ada Lovelace".to_string(),
        email: Some("ada@example.org".to_string()),
        phone: None,
    };
    services.members.create(request.clone()).await.unwrap();
    let shouting = MemberRequest {
        email: Some("ADA@example.org".to_string()),
        ..request
    };
    assert!(matches!(
        services.members.create(shouting).await,
        Err(AppError::Conflict(_))
    ));

    let mut book = book_request("Dune", 1);
    book.isbn = Some("9780441013593".to_string());
    services.catalog.create(book.clone()).await.unwrap();
    assert!(matches!(
        services.catalog.create(book).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_catalog_copy_edits_respect_issued_loans() {
    let library = Library::new();
    let services = library.services();
    let book = library.book("Dune", 3).await;
    let alice = library.member("Alice").await;
    let bob = library.member("Bob").await;

    services.circulation.issue(alice.id, book.id).await.unwrap();
    services.circulation.issue(bob.id, book.id).await.unwrap();

    assert_rejected(
        services.catalog.update(book.id, book_request("Dune", 1)).await,
        RejectReason::CopiesBelowIssued,
    );

    let shrunk = services
        .catalog
        .update(book.id, book_request("Dune", 2))
        .await
        .unwrap();
    assert_eq!(shrunk.available_copies, 0);

    assert_rejected(
        services.catalog.delete(book.id).await,
        RejectReason::BookHasOpenLoans,
    );
    library.assert_availability_invariant().await;
}

#[tokio::test]
async fn test_reports_reflect_circulation_without_mutating() {
    let library = Library::new();
    let services = library.services();
    let alice = library.member("Alice").await;
    let bob = library.member("Bob").await;
    let dune = library.book("Dune", 2).await;
    let emma = library.book("Emma", 1).await;

    let late = services.circulation.issue(alice.id, dune.id).await.unwrap();
    services.circulation.issue(bob.id, dune.id).await.unwrap();
    library.clock.advance(20);
    let returned = services.circulation.return_loan(late.id).await.unwrap();
    assert_eq!(returned.fine_amount, dec("3.00"));

    let before = library.snapshot().await;
    let stats = services.reports.stats().await.unwrap();
    assert_eq!(stats.total_books, 2);
    assert_eq!(stats.active_loans, 1);
    assert_eq!(stats.overdue_loans, 1);
    assert_eq!(stats.total_members, 2);
    assert_eq!(stats.outstanding_fines, dec("3.00"));

    let overdue = services.reports.overdue(PageQuery::default()).await.unwrap();
    assert_eq!(overdue.total, 1);
    assert_eq!(overdue.items[0].member_name, "Bob");
    assert_eq!(overdue.items[0].days_overdue, 6);
    assert_eq!(overdue.items[0].accrued_fine, dec("3.00"));

    let popular = services
        .reports
        .popular_books(Default::default())
        .await
        .unwrap();
    assert_eq!(popular.total, 1);
    assert_eq!(popular.items[0].book_id, dune.id);
    assert_eq!(popular.items[0].borrow_count, 2);
    assert!(popular.items.iter().all(|p| p.book_id != emma.id));

    let after = library.snapshot().await;
    assert_eq!(before.borrowings, after.borrowings);
    assert_eq!(before.books, after.books);
}

#[tokio::test]
async fn test_inventory_report_summarizes_stock() {
    let library = Library::new();
    let services = library.services();
    let alice = library.member("Alice").await;
    let bob = library.member("Bob").await;
    let dune = library.book("Dune", 2).await;
    let emma = library.book("Emma", 1).await;
    let mut cosmos = book_request("Cosmos", 3);
    cosmos.category = Some("Science".to_string());
    services.catalog.create(cosmos).await.unwrap();

    services.circulation.issue(alice.id, dune.id).await.unwrap();
    services.circulation.issue(bob.id, emma.id).await.unwrap();

    let report = services.reports.inventory(InventoryQuery::default()).await.unwrap();
    assert_eq!(
        report.summary,
        InventorySummary {
            total_titles: 3,
            total_copies: 6,
            available_copies: 4,
            issued_copies: 2,
            out_of_stock: 1,
        }
    );
    assert_eq!(report.total, 3);
    assert_eq!(report.total_pages, 1);
    let lines: Vec<(&str, i32, String)> = report
        .inventory
        .iter()
        .map(|i| (i.title.as_str(), i.issued_copies, i.availability_percentage.to_string()))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("Cosmos", 0, "100.00".to_string()),
            ("Dune", 1, "50.00".to_string()),
            ("Emma", 1, "0.00".to_string()),
        ]
    );

    let unavailable = services
        .reports
        .inventory(InventoryQuery {
            availability: Some(Availability::Unavailable),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(unavailable.total, 1);
    assert_eq!(unavailable.inventory[0].book_id, emma.id);

    let fiction = services
        .reports
        .inventory(InventoryQuery {
            category: Some("FICTION".to_string()),
            availability: Some(Availability::Available),
            page: Some(1),
            limit: Some(1),
        })
        .await
        .unwrap();
    assert_eq!(fiction.summary.total_titles, 1);
    assert_eq!(fiction.inventory[0].book_id, dune.id);
    assert_eq!(fiction.per_page, 1);
}

#[tokio::test]
async fn test_member_fine_statement() {
    let library = Library::new();
    let services = library.services();
    let alice = library.member("Alice").await;
    let dune = library.book("Dune", 1).await;
    let emma = library.book("Emma", 1).await;

    let first = services.circulation.issue(alice.id, dune.id).await.unwrap();
    library.clock.advance(1);
    let second = services.circulation.issue(alice.id, emma.id).await.unwrap();
    library.clock.advance(20);
    services.circulation.return_loan(second.id).await.unwrap();
    services.circulation.return_loan(first.id).await.unwrap();

    let statement = services.reports.member_fines(alice.id).await.unwrap();
    assert_eq!(statement.member.id, alice.id);
    assert_eq!(statement.outstanding_fines, dec("6.50"));
    let owed: Vec<(i32, Decimal)> = statement
        .fine_breakdown
        .iter()
        .map(|f| (f.borrow_id, f.fine_amount))
        .collect();
    assert_eq!(owed, vec![(first.id, dec("3.50")), (second.id, dec("3.00"))]);

    services
        .circulation
        .pay_fine(first.id, dec("3.50"), Requester::Staff)
        .await
        .unwrap();
    let statement = services.reports.member_fines(alice.id).await.unwrap();
    assert_eq!(statement.outstanding_fines, dec("3.00"));
    assert_eq!(statement.fine_breakdown.len(), 1);
    assert_eq!(statement.fine_breakdown[0].book_id, emma.id);

    let clean = library.member("Bob").await;
    let statement = services.reports.member_fines(clean.id).await.unwrap();
    assert!(statement.fine_breakdown.is_empty());
    assert_eq!(statement.outstanding_fines, Decimal::ZERO);

    match services.reports.member_fines(999).await {
        Err(AppError::NotFound(Entity::Member, 999)) => {}
        other => panic!("expected member not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fine_report_keeps_fine_assessed_at_return() {
    let library = Library::new();
    let services = library.services();
    let member = library.member("Ada Lovelace").await;
    let book = library.book("Dune", 1).await;

    let loan = services.circulation.issue(member.id, book.id).await.unwrap();
    library.clock.advance(24);
    let returned = services.circulation.return_loan(loan.id).await.unwrap();
    assert_eq!(returned.assessed_fine, dec("5.00"));

    services
        .circulation
        .pay_fine(loan.id, dec("2.00"), Requester::Staff)
        .await
        .unwrap();

    // a later rate change does not rewrite fines already charged
    let repriced = Services::new(
        Arc::new(library.store.clone()),
        library.clock.clone(),
        Arc::new(NoReservations),
        CirculationConfig {
            fine_per_day: dec("2.00"),
            ..Default::default()
        },
    );
    let unpaid = repriced.reports.fines(FineQuery::default()).await.unwrap();
    assert_eq!(unpaid.total, 1);
    assert_eq!(unpaid.items[0].assessed_fine, dec("5.00"));
    assert_eq!(unpaid.items[0].fine_amount, dec("3.00"));
    assert!(!unpaid.items[0].paid);

    services
        .circulation
        .pay_fine(loan.id, dec("3.00"), Requester::Staff)
        .await
        .unwrap();
    let paid = repriced
        .reports
        .fines(FineQuery {
            status: Some(FineStatus::Paid),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(paid.total, 1);
    assert_eq!(paid.items[0].assessed_fine, dec("5.00"));
    assert!(paid.items[0].paid);
}
