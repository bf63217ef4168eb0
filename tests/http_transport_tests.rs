//! HTTP transport tests against a local mock WinRM endpoint
//!
//! Uses wiremock to stand in for the WS-Management listener so the real
//! reqwest transport, header handling and the Negotiate loop are exercised
//! end to end.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use winrs::transport::{HttpTransport, SOAP_CONTENT_TYPE};
use winrs::{ClientConfig, WinRmClient, WinRmError};

const SHELL_ID: &str = "0A1B2C3D-0000-1111-2222-333344445555";

fn config_for(server: &MockServer) -> winrs::config::ClientConfigBuilder {
    ClientConfig::builder(server.address().ip().to_string()).port(server.address().port())
}

fn http_client(
    config: ClientConfig,
) -> (
    WinRmClient<HttpTransport, ScriptedNegotiator>,
    ScriptedNegotiator,
) {
    let transport = HttpTransport::new(&config).unwrap();
    let negotiator = ScriptedNegotiator::new();
    let client = WinRmClient::new(config, transport, negotiator.clone());
    (client, negotiator)
}

#[tokio::test]
async fn test_negotiate_handshake_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wsman"))
        .and(header("Authorization", initial_authorization().as_str()))
        .respond_with(
            ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Negotiate Y2hhbGxlbmdl"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wsman"))
        .and(header("Authorization", "Negotiate c3RlcC0x"))
        .and(header("Content-Type", SOAP_CONTENT_TYPE))
        .and(body_string_contains("transfer/Create"))
        .respond_with(ResponseTemplate::new(200).set_body_string(create_response(SHELL_ID)))
        .expect(1)
        .mount(&server)
        .await;

    let (mut client, negotiator) = http_client(config_for(&server).build().unwrap());

    let shell_id = client.create_shell().await.unwrap();

    assert_eq!(shell_id, SHELL_ID);
    assert_eq!(negotiator.total_steps(), 2);
    assert_eq!(negotiator.challenges(), vec!["Y2hhbGxlbmdl".to_string()]);
}

#[tokio::test]
async fn test_custom_path_is_used() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wsman-custom"))
        .respond_with(ResponseTemplate::new(200).set_body_string(create_response(SHELL_ID)))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).path("/wsman-custom").build().unwrap();
    let (mut client, _) = http_client(config);

    assert_eq!(client.create_shell().await.unwrap(), SHELL_ID);
}

#[tokio::test]
async fn test_server_error_carries_status_and_fault() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string(fault_response("The request for the Windows Remote Shell failed.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (mut client, _) = http_client(config_for(&server).build().unwrap());

    let err = client.create_shell().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.is_transport());
    assert!(err
        .to_string()
        .contains("The request for the Windows Remote Shell failed."));
}

#[tokio::test]
async fn test_endless_challenges_hit_negotiation_cap() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Negotiate AAAA"))
        .mount(&server)
        .await;

    let (mut client, negotiator) = http_client(config_for(&server).build().unwrap());

    let err = client.create_shell().await.unwrap_err();

    assert!(matches!(err, WinRmError::Authentication(_)), "got {:?}", err);
    assert_eq!(negotiator.challenge_steps(), 3);
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 4);
}

#[tokio::test]
async fn test_unauthorized_without_challenge_fails_fast() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (mut client, negotiator) = http_client(config_for(&server).build().unwrap());

    let err = client.create_shell().await.unwrap_err();

    assert!(matches!(err, WinRmError::Authentication(_)));
    assert_eq!(negotiator.challenge_steps(), 0);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(create_response(SHELL_ID))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).timeout_ms(200).build().unwrap();
    let (mut client, _) = http_client(config);

    let err = client.create_shell().await.unwrap_err();

    assert!(matches!(err, WinRmError::Timeout(200)), "got {:?}", err);
    assert!(!client.state().is_open());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_connection_error() {
    // Bind then drop a listener so the port is very likely closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::builder("127.0.0.1")
        .port(port)
        .timeout_ms(2_000)
        .build()
        .unwrap();
    let (mut client, _) = http_client(config);

    let err = client.create_shell().await.unwrap_err();

    assert!(matches!(err, WinRmError::Connection { .. }), "got {:?}", err);
    let source = std::error::Error::source(&err).expect("network error kept as source");
    assert!(source.downcast_ref::<reqwest::Error>().is_some());
}

#[tokio::test]
async fn test_full_session_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("transfer/Create"))
        .respond_with(ResponseTemplate::new(200).set_body_string(create_response(SHELL_ID)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("windows/shell/Command<"))
        .respond_with(ResponseTemplate::new(200).set_body_string(command_response("CMD-1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("windows/shell/Receive<"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(receive_response(&[("stdout", "b2s=")], Some(0))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("transfer/Delete"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_response()))
        .expect(1)
        .mount(&server)
        .await;

    let (mut client, _) = http_client(config_for(&server).build().unwrap());

    client.create_shell().await.unwrap();
    let command_id = client.execute_command("echo ok").await.unwrap();
    let output = client.receive_output(&command_id).await.unwrap();
    client.delete_shell().await.unwrap();

    assert_eq!(output.text, "ok");
    assert_eq!(output.exit_code, Some(0));
    assert!(!client.state().is_open());
}
