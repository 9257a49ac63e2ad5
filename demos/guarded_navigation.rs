//! Console walkthrough of the navigation pipeline: login redirects, data
//! retention, derived titles, and the unsaved-changes prompt.
//!
//! Run with `RUST_LOG=debug cargo run --example guarded_navigation` to watch
//! each stage decide.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Value};

use fieldwork_navigator::{
    HeadlessShell, Navigator, Route, RouteTable, Shell, Transport, TransportError,
};

/// Canned backend: no cookie session, one login identity, one project.
struct DemoBackend;

impl Transport for DemoBackend {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Value, TransportError>> {
        let response = match url {
            "/v1/projects/1" => Ok(json!({"name": "Water Survey", "archived": false})),
            _ => Err(TransportError::Status {
                code: 404,
                message: format!("unknown resource {url}"),
            }),
        };
        Box::pin(async move { response })
    }

    fn restore_session(&self) -> BoxFuture<'static, Result<Value, TransportError>> {
        Box::pin(async {
            Err(TransportError::Status {
                code: 404,
                message: "no session cookie".into(),
            })
        })
    }

    fn log_in(
        &self,
        email: &str,
        _password: &str,
    ) -> BoxFuture<'static, Result<Value, TransportError>> {
        let session = json!({
            "token": "demo-token",
            "createdAt": chrono::Utc::now().to_rfc3339(),
            "expiresAt": (chrono::Utc::now() + chrono::Duration::hours(24)).to_rfc3339(),
            "principal": {"id": 1, "displayName": email},
        });
        Box::pin(async move { Ok(session) })
    }

    fn log_out(&self, _token: &str) -> BoxFuture<'static, Result<(), TransportError>> {
        Box::pin(async { Ok(()) })
    }
}

fn routes() -> RouteTable {
    RouteTable::new(vec![
        Route::new("/login", "AccountLogin")
            .anonymity_required()
            .title_static("Log in"),
        Route::new("/", "Home").title_static("Home"),
        Route::new("/projects/:projectId", "ProjectLayout")
            .login_required()
            .load_async("ProjectLayout")
            .child(
                Route::new("", "ProjectOverview")
                    .login_required()
                    .validate("project", |project| project["archived"] != true)
                    .title_from("project", |project| {
                        project["name"].as_str().map(String::from)
                    })
                    .preserve_when_params_equal("project", &["projectId"]),
            ),
    ])
    .preserve_everywhere("session")
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let shell = Arc::new(HeadlessShell::new());
    let navigator = Navigator::builder(routes(), Arc::new(DemoBackend) as Arc<dyn Transport>)
        .shell(Arc::clone(&shell) as Arc<dyn Shell>)
        .app_name("Fieldwork")
        .build();

    println!("-- anonymous visit to a guarded page");
    let result = navigator.push("/projects/1").await;
    println!(
        "   {:?} → now at {:?}",
        result,
        navigator.current_path().unwrap_or_default()
    );

    println!("-- logging in returns to the requested page");
    let result = navigator
        .log_in("ada@example.com", "correct horse")
        .await
        .expect("demo backend accepts any credentials");
    println!(
        "   {:?} → now at {:?}",
        result,
        navigator.current_path().unwrap_or_default()
    );

    println!("-- fetching project data drives the title");
    navigator
        .data()
        .fetch("project", "/v1/projects/1")
        .await
        .expect("demo backend serves project 1");
    println!("   title: {:?}", shell.last_title().unwrap_or_default());

    println!("-- unsaved changes block navigation when declined");
    navigator.set_unsaved_changes(true);
    shell.set_confirm_response(false);
    let result = navigator.push("/").await;
    println!(
        "   {:?} → still at {:?}",
        result,
        navigator.current_path().unwrap_or_default()
    );

    println!("-- accepting the prompt lets the transition commit");
    shell.set_confirm_response(true);
    let result = navigator.push("/").await;
    println!(
        "   {:?} → now at {:?}, project data cleared: {}",
        result,
        navigator.current_path().unwrap_or_default(),
        navigator.data().get("project").is_none()
    );

    println!("-- logging out lands on the login view");
    let result = navigator.log_out().await.expect("demo backend never fails");
    println!(
        "   {:?} → now at {:?}, logged in: {}",
        result,
        navigator.current_path().unwrap_or_default(),
        navigator.is_logged_in()
    );
}
