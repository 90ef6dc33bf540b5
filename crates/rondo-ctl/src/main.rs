//! rondo-ctl — command-line interface for a running rondo node.

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_PORT: u16 = 8080;

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    name:                String,
    uuid:                String,
    role:                String,
    successor:           Option<String>,
    members:             usize,
    clock:               u64,
    last_seen_timestamp: u64,
    timeouts:            u32,
    round_trip_pending:  bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayResponse {
    content_result:        String,
    original_length:       usize,
    original_hash:         String,
    received_hash:         String,
    received_length:       usize,
    received_content_type: String,
    signatures:            SignaturesResponse,
}

#[derive(Deserialize)]
struct SignaturesResponse {
    items: Vec<SignatureInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureInfo {
    name:           String,
    hash:           String,
    content_length: usize,
}

// ── HTTP helpers ──────────────────────────────────────────────────────────────

fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}", port)
}

async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to rondod at {} — is it running?", url))?
        .json::<T>()
        .await
        .context("failed to parse response")
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("node returned {}: {}", status, body)
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Rondo Node Status");
    println!("═══════════════════════════════════════");
    println!("  Name       : {}", resp.name);
    println!("  UUID       : {}", resp.uuid);
    println!("  Role       : {}", resp.role);
    match &resp.successor {
        Some(next) => println!("  Successor  : {}", next),
        None       => println!("  Successor  : (none — terminal hop)"),
    }
    println!("  Members    : {}", resp.members);
    println!("  Clock      : {}", resp.clock);
    println!("  Last seen  : {}", resp.last_seen_timestamp);
    println!("  Timeouts   : {}", resp.timeouts);
    if resp.round_trip_pending {
        println!("\n  A round trip is currently in flight.");
    }

    Ok(())
}

async fn cmd_send(port: u16, text: &str) -> Result<()> {
    let response = reqwest::Client::new()
        .post(format!("{}/play", base_url(port)))
        .header("Content-Type", "text/plain")
        .body(text.to_string())
        .send()
        .await
        .with_context(|| format!("failed to connect to rondod at port {} — is it running?", port))?;
    let resp: PlayResponse = expect_success(response).await?.json().await
        .context("failed to parse response")?;

    println!("═══════════════════════════════════════");
    println!("  Round Trip: {}", resp.content_result);
    println!("═══════════════════════════════════════");
    println!("  Sent     : {} bytes, hash {}", resp.original_length, &resp.original_hash[..16.min(resp.original_hash.len())]);
    println!("  Received : {} bytes ({}), hash {}", resp.received_length, resp.received_content_type, &resp.received_hash[..16.min(resp.received_hash.len())]);

    if resp.signatures.items.is_empty() {
        println!("\n  No hop signatures recorded.");
    } else {
        println!("\n  Signature chain ({} hops):", resp.signatures.items.len());
        for s in &resp.signatures.items {
            println!("  ┌─ {}", s.name);
            println!("  │  hash  : {}", &s.hash[..16.min(s.hash.len())]);
            println!("  └─ bytes : {}", s.content_length);
        }
    }

    Ok(())
}

async fn cmd_leave(port: u16, uuid: &str, salt: &str) -> Result<()> {
    let response = reqwest::Client::new()
        .post(format!("{}/unregister-node", base_url(port)))
        .query(&[("uuid", uuid), ("salt", salt)])
        .send()
        .await
        .with_context(|| format!("failed to connect to rondod at port {} — is it running?", port))?;
    let text = expect_success(response).await?.text().await?;
    println!("{}", text);
    Ok(())
}

fn print_usage() {
    println!("Usage: rondo-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status               Show node role, successor, and ring clock");
    println!("  send <text>          Send a message around the ring (origin only)");
    println!("  leave <uuid> <salt>  Unregister a member from the origin's ring");
    println!();
    println!("Options:");
    println!("  --port <port>   Node API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args.get(i)
            .context("--port requires a value")?
            .parse()
            .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | []                => cmd_status(port).await,
        ["send", text]                 => cmd_send(port, text).await,
        ["leave", uuid, salt]          => cmd_leave(port, uuid, salt).await,
        ["help"] | ["--help"] | ["-h"] => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            print_usage();
            std::process::exit(2);
        }
    }
}
