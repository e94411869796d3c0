//! Lending scenarios driven through the service layer

use tokio_test::{assert_err, assert_ok};

use lendshelf_server::{
    error::AppError,
    models::{
        account::{RegisterAccount, VisibilitySettings},
        borrow::{BorrowRequest, BorrowStatus},
    },
};

use crate::common::{admin, item_input, lender, test_state, PASSWORD};

fn request(name: &str) -> BorrowRequest {
    BorrowRequest {
        borrower_name: name.to_string(),
    }
}

#[tokio::test]
async fn drill_goes_out_and_comes_back() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;

    let drill = assert_ok!(services.catalog.create_item(&alice, item_input("Drill")).await);

    let borrow = assert_ok!(
        services
            .public
            .request_borrow(&alice.lending_token, drill.id, request("  Sam "))
            .await
    );
    assert_eq!(borrow.status, BorrowStatus::Requested);
    assert_eq!(borrow.borrower_name, "Sam");

    let open = assert_ok!(services.borrows.open_requests(&alice).await);
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].item_title, "Drill");

    let approved = assert_ok!(services.borrows.approve(&alice, borrow.id).await);
    assert_eq!(approved.borrow.status, BorrowStatus::Approved);
    assert!(approved.borrow.approved_at.is_some());

    let lent = assert_ok!(services.borrows.mark_lent(&alice, borrow.id).await);
    assert_eq!(lent.borrow.status, BorrowStatus::LentOut);
    assert!(lent.borrow.lent_at.is_some());

    let owned = assert_ok!(services.catalog.get_item(&alice, drill.id).await);
    assert!(owned.is_currently_borrowed);
    assert_eq!(
        owned.current_borrow.map(|b| b.borrower_name),
        Some("Sam".to_string())
    );
    assert_eq!(assert_ok!(services.borrows.current_lendings(&alice).await).len(), 1);
    assert!(assert_ok!(services.borrows.open_requests(&alice).await).is_empty());

    let returned = assert_ok!(services.borrows.mark_returned(&alice, borrow.id).await);
    assert_eq!(returned.borrow.status, BorrowStatus::Returned);
    assert!(returned.borrow.returned_at >= returned.borrow.lent_at);

    let owned = assert_ok!(services.catalog.get_item(&alice, drill.id).await);
    assert!(!owned.is_currently_borrowed);
    assert!(owned.current_borrow.is_none());
}

#[tokio::test]
async fn public_page_follows_visibility_settings() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let token = alice.lending_token.clone();

    let drill = assert_ok!(services.catalog.create_item(&alice, item_input("Drill")).await);
    let borrow = assert_ok!(services.public.request_borrow(&token, drill.id, request("Sam")).await);
    assert_ok!(services.borrows.approve(&alice, borrow.id).await);
    assert_ok!(services.borrows.mark_lent(&alice, borrow.id).await);

    // defaults: loan state shown, names and history hidden
    let catalog = assert_ok!(services.public.catalog(&token).await);
    assert_eq!(catalog.lender, "alice");
    assert_eq!(catalog.items[0].is_borrowed, Some(true));
    assert_eq!(catalog.items[0].borrower_name, None);

    let hidden = VisibilitySettings {
        show_borrowed_items: false,
        show_borrower_name: true,
        show_lending_history: false,
        show_history_borrower_names: false,
    };
    let alice = assert_ok!(services.accounts.update_visibility(&alice, hidden).await);
    let catalog = assert_ok!(services.public.catalog(&token).await);
    assert_eq!(catalog.items[0].is_borrowed, None);
    // a borrower name never shows without the loan state
    assert_eq!(catalog.items[0].borrower_name, None);

    assert_ok!(services.borrows.mark_returned(&alice, borrow.id).await);
    let detail = assert_ok!(services.public.item_detail(&token, drill.id).await);
    assert!(detail.history.is_none());

    let open = VisibilitySettings {
        show_borrowed_items: true,
        show_borrower_name: true,
        show_lending_history: true,
        show_history_borrower_names: true,
    };
    assert_ok!(services.accounts.update_visibility(&alice, open).await);
    let detail = assert_ok!(services.public.item_detail(&token, drill.id).await);
    let history = detail.history.expect("history shown");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].borrower_name.as_deref(), Some("Sam"));
    assert!(history[0].returned_at.is_some());
    assert_eq!(detail.item.is_borrowed, Some(false));
}

#[tokio::test]
async fn denied_requests_stay_denied_and_out_of_history() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let drill = assert_ok!(services.catalog.create_item(&alice, item_input("Drill")).await);
    let borrow = assert_ok!(
        services
            .public
            .request_borrow(&alice.lending_token, drill.id, request("Sam"))
            .await
    );

    let denied = assert_ok!(services.borrows.deny(&alice, borrow.id).await);
    assert_eq!(denied.borrow.status, BorrowStatus::Denied);
    assert!(denied.borrow.approved_at.is_none());

    let err = assert_err!(services.borrows.approve(&alice, borrow.id).await);
    assert!(matches!(err, AppError::InvalidTransition(_)));
    let err = assert_err!(services.borrows.deny(&alice, borrow.id).await);
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let history = assert_ok!(services.borrows.item_history(&drill).await);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, BorrowStatus::Denied);

    let settings = VisibilitySettings {
        show_lending_history: true,
        ..VisibilitySettings::default()
    };
    assert_ok!(services.accounts.update_visibility(&alice, settings).await);
    let detail = assert_ok!(services.public.item_detail(&alice.lending_token, drill.id).await);
    assert_eq!(detail.history, Some(Vec::new()));
}

#[tokio::test]
async fn only_one_borrow_can_hold_an_item() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let token = alice.lending_token.clone();
    let drill = assert_ok!(services.catalog.create_item(&alice, item_input("Drill")).await);

    let sam = assert_ok!(services.public.request_borrow(&token, drill.id, request("Sam")).await);
    let kim = assert_ok!(services.public.request_borrow(&token, drill.id, request("Kim")).await);
    assert_ok!(services.borrows.approve(&alice, sam.id).await);
    assert_ok!(services.borrows.approve(&alice, kim.id).await);

    assert_ok!(services.borrows.mark_lent(&alice, sam.id).await);
    let err = assert_err!(services.borrows.mark_lent(&alice, kim.id).await);
    assert!(matches!(err, AppError::InvalidTransition(_)));

    // Kim's approval survives the refusal
    let open = assert_ok!(services.borrows.open_requests(&alice).await);
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].borrow.status, BorrowStatus::Approved);

    assert_ok!(services.borrows.mark_returned(&alice, sam.id).await);
    let lent = assert_ok!(services.borrows.mark_lent(&alice, kim.id).await);
    assert_eq!(lent.borrow.status, BorrowStatus::LentOut);
}

#[tokio::test]
async fn unavailable_items_refuse_new_requests() {
    let (state, store) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let drill = assert_ok!(services.catalog.create_item(&alice, item_input("Drill")).await);

    let toggled = assert_ok!(services.catalog.toggle_availability(&alice, drill.id).await);
    assert!(!toggled.is_available);

    let err = assert_err!(
        services
            .public
            .request_borrow(&alice.lending_token, drill.id, request("Sam"))
            .await
    );
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.borrow_count(), 0);

    let err = assert_err!(
        services
            .public
            .request_borrow(&alice.lending_token, drill.id, request("   "))
            .await
    );
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn toggling_availability_leaves_a_loan_in_progress_alone() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let drill = assert_ok!(services.catalog.create_item(&alice, item_input("Drill")).await);
    let borrow = assert_ok!(
        services
            .public
            .request_borrow(&alice.lending_token, drill.id, request("Sam"))
            .await
    );
    assert_ok!(services.borrows.approve(&alice, borrow.id).await);
    assert_ok!(services.borrows.mark_lent(&alice, borrow.id).await);

    assert_ok!(services.catalog.toggle_availability(&alice, drill.id).await);
    let owned = assert_ok!(services.catalog.get_item(&alice, drill.id).await);
    assert!(owned.is_currently_borrowed);

    assert_ok!(services.borrows.mark_returned(&alice, borrow.id).await);
}

#[tokio::test]
async fn other_lenders_items_and_borrows_look_missing() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let (bob, _) = lender(&state, "bob").await;

    let drill = assert_ok!(services.catalog.create_item(&alice, item_input("Drill")).await);
    let borrow = assert_ok!(
        services
            .public
            .request_borrow(&alice.lending_token, drill.id, request("Sam"))
            .await
    );

    let err = assert_err!(services.catalog.get_item(&bob, drill.id).await);
    assert!(matches!(err, AppError::NotFound(_)));
    let err = assert_err!(services.catalog.delete_item(&bob, drill.id).await);
    assert!(matches!(err, AppError::NotFound(_)));
    let err = assert_err!(services.borrows.approve(&bob, borrow.id).await);
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(assert_ok!(services.borrows.open_requests(&bob).await).is_empty());

    // Alice's item is not reachable through Bob's lending page either
    let err = assert_err!(services.public.item_detail(&bob.lending_token, drill.id).await);
    assert!(matches!(err, AppError::NotFound(_)));
    let err = assert_err!(
        services
            .public
            .request_borrow(&bob.lending_token, drill.id, request("Sam"))
            .await
    );
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn deleting_an_item_takes_its_borrows_along() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let drill = assert_ok!(services.catalog.create_item(&alice, item_input("Drill")).await);
    let borrow = assert_ok!(
        services
            .public
            .request_borrow(&alice.lending_token, drill.id, request("Sam"))
            .await
    );

    assert_ok!(services.catalog.delete_item(&alice, drill.id).await);

    let err = assert_err!(services.borrows.approve(&alice, borrow.id).await);
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(assert_ok!(services.catalog.list_items(&alice).await).is_empty());
}

#[tokio::test]
async fn regenerated_token_retires_the_old_page() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let old_token = alice.lending_token.clone();

    let updated = assert_ok!(services.accounts.regenerate_token(&alice).await);
    assert_ne!(updated.lending_token, old_token);

    let err = assert_err!(services.public.catalog(&old_token).await);
    assert!(matches!(err, AppError::NotFound(_)));
    let catalog = assert_ok!(services.public.catalog(&updated.lending_token).await);
    assert_eq!(catalog.lender, "alice");
}

#[tokio::test]
async fn registration_waits_for_admin_approval() {
    let (state, _) = test_state();
    let services = &state.services;
    let (root, _) = admin(&state, "root").await;

    let carol = assert_ok!(
        services
            .auth
            .register(RegisterAccount {
                handle: "carol".to_string(),
                password: PASSWORD.to_string(),
                password_confirm: PASSWORD.to_string(),
            })
            .await
    );
    assert!(!carol.is_approved);

    let err = assert_err!(services.auth.authenticate("carol", PASSWORD).await);
    assert!(matches!(err, AppError::PendingApproval));
    let err = assert_err!(services.public.catalog(&carol.lending_token).await);
    assert!(matches!(err, AppError::NotFound(_)));

    let pending = assert_ok!(services.accounts.list(&root, true).await);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].handle, "carol");

    assert_ok!(services.accounts.set_approved(&root, carol.id, true).await);
    assert_ok!(services.auth.authenticate("CAROL", PASSWORD).await);
    assert_ok!(services.public.catalog(&carol.lending_token).await);
    assert!(assert_ok!(services.accounts.list(&root, true).await).is_empty());

    assert_ok!(services.accounts.set_approved(&root, carol.id, false).await);
    let err = assert_err!(services.public.catalog(&carol.lending_token).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn registration_rejects_bad_input() {
    let (state, _) = test_state();
    let services = &state.services;
    lender(&state, "alice").await;

    let err = assert_err!(
        services
            .auth
            .register(RegisterAccount {
                handle: "dave".to_string(),
                password: PASSWORD.to_string(),
                password_confirm: "something-else-entirely".to_string(),
            })
            .await
    );
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("didn't match")));

    let err = assert_err!(
        services
            .auth
            .register(RegisterAccount {
                handle: "ALICE".to_string(),
                password: PASSWORD.to_string(),
                password_confirm: PASSWORD.to_string(),
            })
            .await
    );
    assert!(matches!(err, AppError::Validation(_)));

    let err = assert_err!(
        services
            .auth
            .register(RegisterAccount {
                handle: "erin".to_string(),
                password: "password".to_string(),
                password_confirm: "password".to_string(),
            })
            .await
    );
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn non_admins_cannot_administer() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, _) = lender(&state, "alice").await;
    let (bob, _) = lender(&state, "bob").await;

    let err = assert_err!(services.accounts.list(&alice, false).await);
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = assert_err!(services.accounts.set_approved(&alice, bob.id, false).await);
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn logout_revokes_issued_tokens() {
    let (state, _) = test_state();
    let services = &state.services;
    let (alice, token) = lender(&state, "alice").await;

    assert_ok!(services.auth.account_from_token(&token).await);
    assert_ok!(services.auth.logout(&alice).await);

    let err = assert_err!(services.auth.account_from_token(&token).await);
    assert!(matches!(err, AppError::Authentication(_)));

    let (fresh, _) = assert_ok!(services.auth.authenticate("alice", PASSWORD).await);
    assert_ok!(services.auth.account_from_token(&fresh).await);
}

#[tokio::test]
async fn root_account_is_created_once() {
    let (state, _) = test_state();
    let services = &state.services;
    let root = lendshelf_server::config::RootAccountConfig {
        username: "root".to_string(),
        password: "short".to_string(),
    };

    assert_ok!(services.auth.ensure_root_account(Some(&root)).await);
    assert_ok!(services.auth.ensure_root_account(Some(&root)).await);
    assert_ok!(services.auth.ensure_root_account(None).await);

    let (_, account) = assert_ok!(services.auth.authenticate("root", "short").await);
    assert!(account.is_admin);
    assert!(account.is_approved);
}

#[tokio::test]
async fn blank_root_credentials_create_nothing() {
    let (state, _) = test_state();
    let services = &state.services;

    let no_password = lendshelf_server::config::RootAccountConfig {
        username: "root".to_string(),
        password: String::new(),
    };
    assert_ok!(services.auth.ensure_root_account(Some(&no_password)).await);

    let no_username = lendshelf_server::config::RootAccountConfig {
        username: "   ".to_string(),
        password: "hunter22".to_string(),
    };
    assert_ok!(services.auth.ensure_root_account(Some(&no_username)).await);

    let err = assert_err!(services.auth.authenticate("root", "").await);
    assert!(matches!(err, AppError::Authentication(_)));

    // only the operator created below exists
    let (operator, _) = admin(&state, "operator").await;
    let accounts = assert_ok!(services.accounts.list(&operator, false).await);
    assert_eq!(accounts.len(), 1);
}
