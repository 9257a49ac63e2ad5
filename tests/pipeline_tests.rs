//! Integration tests for the navigation pipeline.
//!
//! Each test drives a [`Navigator`] end to end through the scriptable
//! transport and recording shell from `common`, covering bootstrap,
//! authorization, data validity, unsaved changes, data retention, view
//! preloading, watchers, and supersession.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use tokio::task::yield_now;

use common::FakeTransport;
use fieldwork_navigator::{
    ClientStore, LoadFn, LocaleLoader, MemoryClientStore, Navigator, NavigationError,
    NavigationResult, Route, RouteTable, Transport, TransportError, LOCALE_STORAGE_KEY,
};

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn test_bootstrap_runs_once() {
    let f = common::logged_in_fixture();
    f.navigator.push("/").await;
    f.navigator.push("/account/edit").await;
    f.navigator.back().await;

    assert_eq!(f.transport.restore_calls(), 1, "restore must not rerun");
    assert!(f.navigator.is_logged_in());
}

#[tokio::test]
async fn test_bootstrap_restore_skipped_when_terminal_opts_out() {
    let f = common::logged_in_fixture();
    let result = f.navigator.push("/reset-password").await;

    assert!(result.is_success());
    assert_eq!(f.transport.restore_calls(), 0);
    assert!(!f.navigator.is_logged_in());

    // The skip is permanent: bootstrap never reruns for later navigations.
    f.navigator.push("/login").await;
    assert_eq!(f.transport.restore_calls(), 0);
}

#[tokio::test]
async fn test_bootstrap_uses_stored_locale() {
    let store = Arc::new(MemoryClientStore::new());
    store.set(LOCALE_STORAGE_KEY, "de");
    let f = common::build_fixture(FakeTransport::new(), |builder| {
        builder.client_store(store as Arc<dyn ClientStore>)
    });

    f.navigator.push("/login").await;
    assert_eq!(f.navigator.locale(), "de");
}

#[tokio::test]
async fn test_bootstrap_falls_back_when_locale_fails_to_load() {
    let store = Arc::new(MemoryClientStore::new());
    store.set(LOCALE_STORAGE_KEY, "fr");
    let loader: LocaleLoader = Arc::new(|tag: String| -> BoxFuture<'static, Result<(), TransportError>> {
        Box::pin(async move {
            if tag == "en" {
                Ok(())
            } else {
                Err(TransportError::Network {
                    message: format!("no bundle for {tag}"),
                })
            }
        })
    });
    let f = common::build_fixture(FakeTransport::new(), |builder| {
        builder
            .client_store(store as Arc<dyn ClientStore>)
            .locale_loader(loader)
    });

    let result = f.navigator.push("/login").await;
    assert!(result.is_success(), "a failed locale load never blocks navigation");
    assert_eq!(f.navigator.locale(), "en");
}

#[tokio::test]
async fn test_failed_restore_leaves_user_anonymous() {
    let f = common::fixture();
    let result = f.navigator.push("/").await;

    assert!(result.is_success(), "a failed restore never blocks navigation");
    assert_eq!(f.transport.restore_calls(), 1);
    assert!(!f.navigator.is_logged_in());
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_login_redirect_round_trip() {
    let f = common::fixture();

    let result = f.navigator.push("/projects/1?tab=forms").await;
    assert!(result.is_success(), "the redirect itself commits: {result:?}");
    assert_eq!(
        f.navigator.current_path(),
        Some("/login?next=%2Fprojects%2F1%3Ftab%3Dforms".to_string())
    );

    f.transport.set_login(Ok(common::session_json(24)));
    let result = f.navigator.log_in("ada@example.com", "secret").await.unwrap();
    assert!(result.is_success());
    assert!(f.navigator.is_logged_in());
    assert_eq!(
        f.navigator.current_path(),
        Some("/projects/1?tab=forms".to_string()),
        "login returns to the originally requested page"
    );
}

#[tokio::test]
async fn test_logged_in_user_bounced_off_anonymity_route() {
    let f = common::logged_in_fixture();

    let result = f.navigator.push("/login").await;
    assert!(result.is_success());
    assert_eq!(f.navigator.current_path(), Some("/".to_string()));
}

#[tokio::test]
async fn test_log_out_returns_to_login() {
    let f = common::logged_in_fixture();
    f.navigator.push("/").await;
    assert!(f.navigator.is_logged_in());

    let result = f.navigator.log_out().await.unwrap();
    assert!(result.is_success());
    assert!(!f.navigator.is_logged_in());
    assert_eq!(f.navigator.current_path(), Some("/login".to_string()));
}

#[tokio::test]
async fn test_redirect_loop_reports_error() {
    // A login view that itself requires a session can never settle.
    let table = RouteTable::new(vec![
        Route::new("/login", "AccountLogin").login_required(),
        Route::new("/private", "Private").login_required(),
    ]);
    let navigator =
        Navigator::builder(table, Arc::new(FakeTransport::new()) as Arc<dyn Transport>).build();

    let result = navigator.push("/private").await;
    assert!(
        matches!(
            result,
            NavigationResult::Error(NavigationError::TooManyRedirects { .. })
        ),
        "got {result:?}"
    );
    assert_eq!(navigator.current_path(), None, "nothing committed");
}

// ============================================================================
// Data validity
// ============================================================================

#[tokio::test]
async fn test_navigation_into_invalid_data_redirects() {
    let f = common::logged_in_fixture();
    f.navigator.push("/").await;
    f.navigator
        .data()
        .write("project", json!({"name": "Beta", "archived": true}));

    let result = f.navigator.push("/projects/3").await;
    assert!(result.is_success(), "the redirect commits: {result:?}");
    assert_eq!(f.navigator.current_path(), Some("/".to_string()));
}

#[tokio::test]
async fn test_absent_data_passes_validity_checks() {
    let f = common::logged_in_fixture();

    let result = f.navigator.push("/projects/3").await;
    assert!(result.is_success());
    assert_eq!(f.navigator.current_path(), Some("/projects/3".to_string()));
}

#[tokio::test]
async fn test_invalid_data_watcher_leaves_page() {
    let f = common::logged_in_fixture();
    f.navigator.push("/projects/7").await;

    f.navigator
        .data()
        .write("project", json!({"name": "Beta", "archived": false}));
    common::settle().await;
    assert_eq!(
        f.navigator.current_path(),
        Some("/projects/7".to_string()),
        "valid data keeps the page"
    );

    f.navigator.set_unsaved_changes(true);
    f.shell.set_confirm_response(false);
    f.navigator
        .data()
        .write("project", json!({"name": "Beta", "archived": true}));
    common::settle().await;
    assert_eq!(
        f.navigator.current_path(),
        Some("/".to_string()),
        "invalidated data forces the default view without prompting"
    );
    assert_eq!(f.shell.confirms_asked(), 0);
}

// ============================================================================
// Unsaved changes
// ============================================================================

#[tokio::test]
async fn test_declined_confirm_blocks_navigation() {
    let f = common::fixture();
    f.navigator.push("/").await;
    f.navigator.set_unsaved_changes(true);
    f.shell.set_confirm_response(false);

    let result = f.navigator.push("/login").await;
    assert!(result.is_blocked(), "got {result:?}");
    assert_eq!(f.navigator.current_path(), Some("/".to_string()));
    assert!(
        f.navigator.should_block_unload(),
        "declining keeps the dirty flag"
    );
    assert_eq!(f.shell.confirms_asked(), 1);

    f.shell.set_confirm_response(true);
    let result = f.navigator.push("/login").await;
    assert!(result.is_success());
    assert!(!f.navigator.should_block_unload(), "a commit resets the flag");
}

#[tokio::test]
async fn test_back_blocked_by_unsaved_changes() {
    let f = common::fixture();
    f.navigator.push("/").await;
    f.navigator.push("/login").await;
    f.navigator.set_unsaved_changes(true);
    f.shell.set_confirm_response(false);

    let result = f.navigator.back().await.unwrap();
    assert!(result.is_blocked());
    assert_eq!(f.navigator.current_path(), Some("/login".to_string()));
    assert!(
        f.navigator.can_go_back(),
        "history untouched by the blocked back"
    );
}

#[tokio::test]
async fn test_force_replace_skips_prompt() {
    let f = common::fixture();
    f.navigator.push("/").await;
    f.navigator.set_unsaved_changes(true);
    f.shell.set_confirm_response(false);

    let result = f.navigator.force_replace("/login").await;
    assert!(result.is_success());
    assert_eq!(f.shell.confirms_asked(), 0);
    assert_eq!(f.navigator.current_path(), Some("/login".to_string()));
}

// ============================================================================
// Data retention
// ============================================================================

#[tokio::test]
async fn test_first_navigation_clears_nothing() {
    let f = common::logged_in_fixture();
    f.navigator.data().write("scratch", json!(1));

    f.navigator.push("/").await;
    assert!(
        f.navigator.data().get("scratch").is_some(),
        "retention is skipped while history is empty"
    );
    assert!(
        f.navigator.is_logged_in(),
        "the just-restored session survives the first commit"
    );

    f.navigator.push("/account/edit").await;
    assert!(f.navigator.data().get("scratch").is_none());
}

#[tokio::test]
async fn test_unpreserved_data_cleared_on_navigation() {
    let f = common::logged_in_fixture();
    f.navigator.push("/projects/1").await;
    f.navigator
        .data()
        .write("project", json!({"name": "Alpha", "archived": false}));
    f.navigator.data().write("diagnostics", json!([1, 2, 3]));

    // Same projectId: the keyed rule holds, unlisted keys drop.
    f.navigator.push("/projects/1/forms/f1").await;
    assert!(f.navigator.data().get("project").is_some());
    assert!(f.navigator.data().get("diagnostics").is_none());
    assert!(f.navigator.is_logged_in());

    // Different projectId: the keyed rule no longer holds.
    f.navigator.push("/projects/2").await;
    assert!(f.navigator.data().get("project").is_none());
    assert!(
        f.navigator.is_logged_in(),
        "the session is preserved on every route"
    );
}

// ============================================================================
// View preloading
// ============================================================================

#[tokio::test]
async fn test_chain_views_preloaded() {
    let f = common::logged_in_fixture();
    f.navigator.push("/projects/1").await;
    common::settle().await;

    assert!(f.navigator.loader().is_loaded("ProjectLayout"));
    assert!(f.navigator.loader().is_loaded("ProjectOverview"));
    assert!(!f.navigator.loader().is_loaded("FormShow"));
}

#[tokio::test]
async fn test_preload_runs_once_per_view() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let load_fn: LoadFn = Arc::new(
        move |_name: &str| -> BoxFuture<'static, Result<(), TransportError>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        },
    );
    let transport = FakeTransport::new();
    transport.set_restore(Ok(common::session_json(24)));
    let f = common::build_fixture(transport, |builder| builder.view_loader(load_fn));

    f.navigator.push("/projects/1").await;
    common::settle().await;
    f.navigator.push("/").await;
    f.navigator.push("/projects/1").await;
    common::settle().await;

    assert_eq!(
        loads.load(Ordering::SeqCst),
        2,
        "ProjectLayout and ProjectOverview each load exactly once"
    );
}

// ============================================================================
// Titles and alerts
// ============================================================================

#[tokio::test]
async fn test_title_static_and_fallback() {
    let f = common::fixture();
    f.navigator.push("/").await;
    assert_eq!(f.shell.last_title(), Some("Home | Fieldwork".to_string()));

    f.navigator.push("/login").await;
    assert_eq!(f.shell.last_title(), Some("Log in | Fieldwork".to_string()));
}

#[tokio::test]
async fn test_title_derived_from_data_updates_on_write() {
    let f = common::logged_in_fixture();
    f.navigator.push("/projects/5").await;
    assert_eq!(
        f.shell.last_title(),
        Some("Fieldwork".to_string()),
        "no data yet, so the app name stands alone"
    );

    f.navigator
        .data()
        .write("project", json!({"name": "Water Survey", "archived": false}));
    assert_eq!(
        f.shell.last_title(),
        Some("Water Survey | Fieldwork".to_string())
    );
}

#[tokio::test]
async fn test_alert_dismissed_on_commit_only() {
    let f = common::fixture();
    f.navigator.push("/").await;
    f.navigator.alerts().danger("Something failed");
    f.navigator.set_unsaved_changes(true);
    f.shell.set_confirm_response(false);

    f.navigator.push("/login").await;
    assert!(
        f.navigator.alerts().is_visible(),
        "a blocked navigation leaves the alert up"
    );

    f.shell.set_confirm_response(true);
    f.navigator.push("/login").await;
    assert!(!f.navigator.alerts().is_visible());
}

// ============================================================================
// Supersession
// ============================================================================

#[tokio::test]
async fn test_superseded_navigation_never_commits() {
    let f = common::fixture();
    f.transport.gate_restore();

    let nav_a = f.navigator.clone();
    let a = tokio::spawn(async move { nav_a.push("/account/edit").await });
    yield_now().await;

    let nav_b = f.navigator.clone();
    let b = tokio::spawn(async move { nav_b.push("/").await });
    yield_now().await;

    f.transport.release_restore();
    let result_a = a.await.unwrap();
    let result_b = b.await.unwrap();

    assert!(
        result_a.is_superseded(),
        "the older transition must yield: {result_a:?}"
    );
    assert!(result_b.is_success(), "got {result_b:?}");
    assert_eq!(f.navigator.current_path(), Some("/".to_string()));
}

#[tokio::test]
async fn test_superseded_navigation_leaves_no_side_effects() {
    let f = common::fixture();
    f.transport.gate_restore();
    f.navigator.alerts().danger("Stale alert");

    let nav_a = f.navigator.clone();
    let a = tokio::spawn(async move { nav_a.push("/login").await });
    yield_now().await;

    // Supersede before releasing the bootstrap; the winner blocks on the
    // unsaved-changes prompt, so neither transition commits.
    f.navigator.set_unsaved_changes(true);
    f.shell.set_confirm_response(false);
    let nav_b = f.navigator.clone();
    let b = tokio::spawn(async move { nav_b.push("/").await });
    yield_now().await;
    f.transport.release_restore();

    assert!(a.await.unwrap().is_superseded());
    assert!(b.await.unwrap().is_blocked());
    assert_eq!(f.navigator.current_path(), None);
    assert!(
        f.navigator.alerts().is_visible(),
        "post-entry stages of a superseded transition never run"
    );
    assert_eq!(
        f.shell.titles().len(),
        0,
        "no title without a committed route"
    );
}
