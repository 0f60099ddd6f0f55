#![allow(dead_code)]

use desktoppr::Client;
use mock_server::MockServer;
use std::net::TcpListener;

/// A fresh server with seeded data, and a client pointed at it.
pub fn setup() -> (MockServer, Client) {
    let _ = pretty_env_logger::try_init_timed();
    let server = MockServer::start().expect("mock server failed to start");
    let client = Client::with_base_url(&server.base_url()).expect("client");
    (server, client)
}

pub fn authed(username: &str) -> (MockServer, Client) {
    let (server, mut client) = setup();
    let token = format!("{}-token", username.trim_end_matches("pitt"));
    assert!(client.authorize_token(&token), "token {token} rejected");
    (server, client)
}

/// A base URL nothing listens on, so every request is refused.
pub fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/1")
}
