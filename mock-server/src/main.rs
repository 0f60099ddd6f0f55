use actix_web::web;
use mock_server::{Mock, World};
use std::net::TcpListener;

#[macro_use]
extern crate log;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let listener = TcpListener::bind(("127.0.0.1", port.parse::<u16>().unwrap_or(3000)))?;
    info!("listening on http://{}/1", listener.local_addr()?);
    mock_server::run(listener, web::Data::new(Mock::new(World::seed()))).await
}
