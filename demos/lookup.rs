#![deny(warnings)]

// Resolve a name the way an HTTP client would before connecting.
//
//     cargo run --example lookup -- printer.local 631
use reqwest_mdns::dns::Family;
use reqwest_mdns::MdnsResolver;

#[tokio::main]
async fn main() -> Result<(), reqwest_mdns::Error> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "localhost".into());
    let port = args.next().and_then(|p| p.parse().ok()).unwrap_or(80);

    let resolver = MdnsResolver::new();
    let result = resolver.resolve(&host, port, Family::Unspecified).await;
    resolver.close().await;

    for addr in result? {
        println!("{} -> {}", addr.hostname(), addr.socket_addr());
    }

    Ok(())
}
