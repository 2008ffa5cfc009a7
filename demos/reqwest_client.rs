#![deny(warnings)]

// Fetch a page from a device on the local network.
//
//     cargo run --example reqwest_client --features reqwest -- http://printer.local/
use std::sync::Arc;
use std::time::Duration;

use reqwest_mdns::MdnsResolver;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost.local/".into());

    let resolver = Arc::new(
        MdnsResolver::builder()
            .mdns_timeout(Duration::from_secs(3))
            .build()?,
    );
    let client = reqwest::Client::builder()
        .dns_resolver(resolver.clone())
        .build()?;

    let res = client.get(&url).send().await?;
    println!("Status: {}", res.status());

    resolver.close().await;
    Ok(())
}
