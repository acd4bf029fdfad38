//! `diagnose`: a one-shot connectivity check against the configured endpoint.

use serde_json::{Value, json};
use survey_bridge_core::{Gateway, GatewayError, Transport};

fn check(name: &str, outcome: Result<Value, &GatewayError>) -> Value {
    match outcome {
        Ok(detail) => json!({ "check": name, "ok": true, "detail": detail }),
        Err(err) => json!({
            "check": name,
            "ok": false,
            "error": err.code(),
            "message": err.to_string()
        }),
    }
}

/// Authenticate, list surveys, release. Missing credentials are returned as
/// `Err`; every other failure is recorded in a `degraded` report.
pub(crate) async fn run_diagnostics<T: Transport>(
    gateway: &Gateway<T>,
    endpoint: &str,
) -> Result<Value, GatewayError> {
    let mut checks = Vec::new();
    let mut ready = true;

    match gateway.get_token().await {
        Ok(_) => checks.push(check("authenticate", Ok(Value::Null))),
        Err(err @ GatewayError::Configuration(_)) => return Err(err),
        Err(err) => {
            checks.push(check("authenticate", Err(&err)));
            return Ok(report(endpoint, false, checks));
        }
    }

    match gateway.list_surveys(None).await {
        Ok(result) => {
            let surveys = result.as_array().map(Vec::len);
            checks.push(check("list_surveys", Ok(json!({ "surveys": surveys }))));
        }
        Err(err) => {
            ready = false;
            checks.push(check("list_surveys", Err(&err)));
        }
    }

    let released = gateway.release_token().await;
    ready &= released;
    checks.push(json!({ "check": "release_token", "ok": released }));

    Ok(report(endpoint, ready, checks))
}

fn report(endpoint: &str, ready: bool, checks: Vec<Value>) -> Value {
    json!({
        "status": if ready { "ready" } else { "degraded" },
        "endpoint": endpoint,
        "checks": checks
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_bridge_core::Credentials;
    use survey_bridge_core::testing::{FakeTransport, Reply};

    const ENDPOINT: &str = "http://surveys.example.org/index.php/admin/remotecontrol";

    #[tokio::test]
    async fn healthy_endpoint_is_ready_and_released() {
        let transport = FakeTransport::new()
            .reply("list_surveys", Reply::result(json!([{"sid": 1}, {"sid": 2}])));
        let gateway = Gateway::with_transport(transport, Credentials::new("admin", "secret"));

        let report = run_diagnostics(&gateway, ENDPOINT).await.unwrap();

        assert_eq!(report["status"], "ready");
        assert_eq!(report["checks"][1]["detail"]["surveys"], 2);
        assert_eq!(gateway.transport().calls("release_token"), 1);
        assert!(!gateway.has_token());
    }

    #[tokio::test]
    async fn rejected_login_is_degraded() {
        let transport =
            FakeTransport::new().reply("authenticate", Reply::result(json!({"status": "Invalid user name or password"})));
        let gateway = Gateway::with_transport(transport, Credentials::new("admin", "wrong"));

        let report = run_diagnostics(&gateway, ENDPOINT).await.unwrap();

        assert_eq!(report["status"], "degraded");
        assert_eq!(report["checks"][0]["error"], "authentication_failed");
        assert_eq!(gateway.transport().calls("list_surveys"), 0);
    }

    #[tokio::test]
    async fn missing_credentials_are_a_configuration_error() {
        let gateway = Gateway::with_transport(FakeTransport::new(), Credentials::default());
        let err = run_diagnostics(&gateway, ENDPOINT).await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
        assert_eq!(gateway.transport().total_calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_degraded() {
        let gateway = Gateway::connect(
            survey_bridge_core::GatewayConfig::new("http://127.0.0.1:9", Credentials::new("a", "b"))
                .with_timeout(std::time::Duration::from_secs(2)),
        )
        .unwrap();

        let report = run_diagnostics(&gateway, "http://127.0.0.1:9").await.unwrap();
        assert_eq!(report["status"], "degraded");
        assert_eq!(report["checks"][0]["error"], "transport_error");
    }
}
