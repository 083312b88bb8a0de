//! End-to-end protocol tests over real sockets.

use bank_server::store::StoreError;

mod common;

use common::{eventually, start_server, test_config, TestClient};

#[tokio::test]
async fn test_account_scenario() {
    let server = start_server(test_config()).await;
    let mut client = TestClient::connect(server.addr).await;

    assert_eq!(client.request("create alice").await, "SUCCESS: New account created");
    assert_eq!(client.request("serve alice").await, "SUCCESS: New session started");
    assert_eq!(client.request("deposit 100.0").await, "SUCCESS: Deposit made");
    assert_eq!(client.request("query").await, "Your current balance is: 100.000000");
    assert_eq!(client.request("withdraw 30.0").await, "SUCCESS: Withdrawl made");
    assert_eq!(client.request("query").await, "Your current balance is: 70.000000");
    assert_eq!(client.request("end").await, "SUCCESS: Session ended");

    client.send("quit").await;
    assert_eq!(client.recv().await, None);

    assert_eq!(server.store.query("alice"), Ok(70.0));
    assert_eq!(server.store.end_session("alice"), Err(StoreError::NotInSession));

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_errors_are_reported_not_fatal() {
    let server = start_server(test_config()).await;
    let mut client = TestClient::connect(server.addr).await;

    assert_eq!(client.request("query").await, "ERROR: Must be in active session");
    assert_eq!(client.request("end").await, "ERROR: Must be in active session");
    assert_eq!(client.request("serve nobody").await, "ERROR: Account does not exist");
    assert_eq!(client.request("deposit -1").await, "ERROR: Invalid command");
    assert_eq!(client.request("create bob").await, "SUCCESS: New account created");
    assert_eq!(client.request("create bob").await, "ERROR: Account already exists");
    assert_eq!(client.request("serve bob").await, "SUCCESS: New session started");
    assert_eq!(client.request("serve bob").await, "ERROR: Must not be in active session");
    assert_eq!(client.request("withdraw 1").await, "ERROR: Insufficient funds");
    assert_eq!(client.request("query").await, "Your current balance is: 0.000000");

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_huge_deposit_is_refused_and_query_still_answers() {
    let server = start_server(test_config()).await;
    let mut client = TestClient::connect(server.addr).await;

    assert_eq!(client.request("create whale").await, "SUCCESS: New account created");
    assert_eq!(client.request("serve whale").await, "SUCCESS: New session started");
    assert_eq!(client.request("deposit 1e300").await, "ERROR: Balance limit exceeded");
    assert_eq!(client.request("deposit 250").await, "SUCCESS: Deposit made");
    assert_eq!(client.request("query").await, "Your current balance is: 250.000000");
    assert_eq!(server.store.snapshot().sessions_active(), 1);

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_non_ascii_request_gets_invalid_command() {
    let server = start_server(test_config()).await;
    let mut client = TestClient::connect(server.addr).await;

    client.send_raw(b"create \xC3\xA9").await;
    assert_eq!(client.recv().await.as_deref(), Some("ERROR: Invalid command"));
    assert!(server.store.is_empty());

    assert_eq!(client.request("create plain").await, "SUCCESS: New account created");

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_concurrent_serve_has_single_winner() {
    let server = start_server(test_config()).await;
    server.store.create("shared").unwrap();

    let mut first = TestClient::connect(server.addr).await;
    let mut second = TestClient::connect(server.addr).await;

    let (a, b) = tokio::join!(first.request("serve shared"), second.request("serve shared"));
    let mut results = vec![a, b];
    results.sort();
    assert_eq!(
        results,
        vec![
            "ERROR: Account already in session".to_string(),
            "SUCCESS: New session started".to_string(),
        ]
    );

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_session_visible_across_connections() {
    let server = start_server(test_config()).await;
    let mut teller = TestClient::connect(server.addr).await;
    let mut other = TestClient::connect(server.addr).await;

    teller.request("create carol").await;
    teller.request("serve carol").await;
    teller.request("deposit 25").await;

    assert_eq!(other.request("serve carol").await, "ERROR: Account already in session");
    teller.request("end").await;
    assert_eq!(other.request("serve carol").await, "SUCCESS: New session started");
    assert_eq!(other.request("query").await, "Your current balance is: 25.000000");

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_disconnect_releases_session() {
    let server = start_server(test_config()).await;

    let mut client = TestClient::connect(server.addr).await;
    client.request("create dave").await;
    client.request("serve dave").await;
    drop(client);

    let store = server.store.clone();
    assert!(eventually(|| store.snapshot().sessions_active() == 0).await);
    assert!(eventually(|| server.tracker.active_count() == 0).await);

    let mut again = TestClient::connect(server.addr).await;
    assert_eq!(again.request("serve dave").await, "SUCCESS: New session started");

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let mut config = test_config();
    config.session.idle_timeout_secs = 1;
    let server = start_server(config).await;

    let mut client = TestClient::connect(server.addr).await;
    client.request("create erin").await;
    client.request("serve erin").await;

    assert_eq!(client.recv().await, None);
    assert_eq!(server.store.snapshot().sessions_active(), 0);

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}
