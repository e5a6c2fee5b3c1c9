use std::fs;
use tracing::info;

use pft::AppCommand;
use pft::cli::banks::BankCommand;
use pft::cli::savings::{SavingCommand, SavingTxKind};
use pft::cli::users::UserCommand;
use pft::core::analytics::TimeRange;

mod test_utils {
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Writes a config file pointing at the mock backend, with the token
    /// stored inside the same temp directory.
    pub fn write_config(dir: &TempDir, base_url: &str) -> String {
        let config_path = dir.path().join("config.yaml");
        let contents = format!(
            "base_url: \"{base_url}\"\ndata_path: \"{}\"\n",
            dir.path().display()
        );
        std::fs::write(&config_path, contents).unwrap();
        config_path.to_string_lossy().into_owned()
    }

    /// Mounts list endpoints for all four entity groups plus empty
    /// transaction feeds, enough for a dashboard load to complete.
    pub async fn mount_dashboard_fixtures(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "name": "Gold", "balance": 500.0}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/banks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "name": "HDFC", "balance": 1000.0}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/savings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "name": "Emergency", "balance": 300.0, "goal": 5000.0}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/credit_cards"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "name": "Visa", "limit": 50000.0, "used": 200.0}]
            })))
            .mount(server)
            .await;
        for feed in [
            "/assets/1/transactions",
            "/banks/1/transactions",
            "/savings/1/transactions",
            "/credit_cards/1/transactions",
        ] {
            Mock::given(method("GET"))
                .and(path(feed))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
                .mount(server)
                .await;
        }
    }
}

#[test_log::test(tokio::test)]
async fn test_dashboard_full_flow() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_dashboard_fixtures(&server).await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri());

    let result = pft::run_command(
        AppCommand::Dashboard {
            range: TimeRange::ThirtyDays,
            watch: false,
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "dashboard failed: {result:?}");

    // All four lists plus all four transaction feeds were hit.
    let requests = server.received_requests().await.unwrap();
    info!("Dashboard made {} requests", requests.len());
    assert_eq!(requests.len(), 8);
}

#[test_log::test(tokio::test)]
async fn test_delete_rejected_while_balance_nonzero() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/banks"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": 7, "name": "HDFC", "balance": 150.0}]
        })))
        .mount(&server)
        .await;
    // The DELETE must never be attempted.
    wiremock::Mock::given(wiremock::matchers::method("DELETE"))
        .and(wiremock::matchers::path("/banks/7"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri());

    let err = pft::run_command(
        AppCommand::Banks(BankCommand::Delete { id: 7 }),
        Some(&config_path),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("150.00"), "unexpected: {err}");
}

#[test_log::test(tokio::test)]
async fn test_delete_allowed_at_zero_balance() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/banks"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": 7, "name": "Old", "balance": 0.0}]
        })))
        .mount(&server)
        .await;
    wiremock::Mock::given(wiremock::matchers::method("DELETE"))
        .and(wiremock::matchers::path("/banks/7"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"message": "deleted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri());

    pft::run_command(
        AppCommand::Banks(BankCommand::Delete { id: 7 }),
        Some(&config_path),
    )
    .await
    .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_login_persists_token_and_authorizes_next_command() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/login"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "tok-42",
            "user": {"id": 1, "name": "ravi"}
        })))
        .mount(&server)
        .await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/users"))
        .and(wiremock::matchers::header("authorization", "Bearer tok-42"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri());

    pft::run_command(
        AppCommand::Login {
            name: "ravi".to_string(),
            password: "pw".to_string(),
        },
        Some(&config_path),
    )
    .await
    .unwrap();

    let token = fs::read_to_string(dir.path().join("token")).unwrap();
    assert_eq!(token, "tok-42");

    // The stored token rides along on the next authenticated command.
    pft::run_command(
        AppCommand::Users(UserCommand::List),
        Some(&config_path),
    )
    .await
    .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_backend_error_message_surfaces() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/banks/dropdown"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": 1, "name": "HDFC", "balance": 0.0}]
        })))
        .mount(&server)
        .await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/savings"))
        .respond_with(wiremock::ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Savings account name already exists"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri());

    let err = pft::run_command(
        AppCommand::Savings(SavingCommand::Add {
            name: "Emergency".to_string(),
            bank_id: 1,
            goal: None,
        }),
        Some(&config_path),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Savings account name already exists");
}

#[test_log::test(tokio::test)]
async fn test_saving_deposit_then_dashboard_reflects_backend() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/savings/1/transactions"))
        .and(wiremock::matchers::body_json(serde_json::json!({
            "amount": 250.0,
            "type": "deposit"
        })))
        .respond_with(
            wiremock::ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({"data": {"id": 9}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    test_utils::mount_dashboard_fixtures(&server).await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri());

    pft::run_command(
        AppCommand::Savings(SavingCommand::Record {
            id: 1,
            amount: "250".to_string(),
            kind: SavingTxKind::Deposit,
            description: None,
        }),
        Some(&config_path),
    )
    .await
    .unwrap();

    // The next dashboard load reads balances fresh from the backend.
    pft::run_command(
        AppCommand::Dashboard {
            range: TimeRange::SevenDays,
            watch: false,
        },
        Some(&config_path),
    )
    .await
    .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_invalid_amount_never_reaches_backend() {
    let server = wiremock::MockServer::start().await;
    // No POST mock: any request would 404 and still count below.

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri());

    for bad in ["0", "-50", "lots"] {
        let err = pft::run_command(
            AppCommand::Savings(SavingCommand::Record {
                id: 1,
                amount: bad.to_string(),
                kind: SavingTxKind::Deposit,
                description: None,
            }),
            Some(&config_path),
        )
        .await
        .unwrap_err();
        info!("Rejected {bad:?}: {err}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}
