use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::Client;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const DURATION_SECS: u64 = 20;

struct Target {
    name: &'static str,
    method: &'static str,
    url: String,
    headers: Vec<(&'static str, String)>,
    body: Option<serde_json::Value>,
}

struct Fixture {
    broker_id: String,
    broker_slug: String,
    property_slug: String,
}

#[tokio::main]
async fn main() {
    let base_url = std::env::var("BENCH_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let base_domain = std::env::var("BENCH_BASE_DOMAIN").unwrap_or_else(|_| "localhost".to_string());

    println!("{}", "🚀 Starting Benchmark Suite".bold().green());
    println!("Target URL: {}", base_url);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .cookie_store(true)
        .build()
        .expect("Failed to build HTTP client");

    if client.get(format!("{}/health", base_url)).send().await.is_err() {
        eprintln!("{}", format!("❌ Server is NOT reachable at {}. Please start it first.", base_url).red().bold());
        return;
    }

    println!("\n{}", "⚙️  Setting up benchmark data...".yellow());
    let fixture = setup(&client, &base_url).await;

    println!("{}", "✅ Data created successfully.".green());
    println!("   Broker ID:   {}", fixture.broker_id);
    println!("   Broker slug: {}", fixture.broker_slug);

    let site_host = format!("{}.{}", fixture.broker_slug, base_domain);
    let targets = vec![
        Target {
            name: "Health Check",
            method: "GET",
            url: format!("{}/health", base_url),
            headers: vec![],
            body: None,
        },
        Target {
            name: "Listing Grid (Path Adapter)",
            method: "GET",
            url: format!("{}/api/v1/public/{}/properties", base_url, fixture.broker_slug),
            headers: vec![],
            body: None,
        },
        Target {
            name: "Property Page (Path Adapter)",
            method: "GET",
            url: format!("{}/api/v1/public/{}/properties/{}", base_url, fixture.broker_slug, fixture.property_slug),
            headers: vec![],
            body: None,
        },
        Target {
            name: "Property Page (Subdomain)",
            method: "GET",
            url: format!("{}/api/v1/site/properties/{}", base_url, fixture.property_slug),
            headers: vec![("x-tenant-domain", site_host)],
            body: None,
        },
        Target {
            name: "Add Favorite (Visitor Write)",
            method: "POST",
            url: format!("{}/api/v1/public/{}/favorites/{}", base_url, fixture.broker_slug, fixture.property_slug),
            headers: vec![],
            body: None,
        },
    ];

    let rps_stages = vec![10, 50, 200, 1000];

    for target in targets {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking Endpoint: {}", target.name.cyan().bold());
        println!("URL: {}", target.url);
        println!("{}", "=".repeat(60));

        println!("{:<10} | {:<15} | {:<15} | {:<15}", "RPS", "Mean (ms)", "P99 (ms)", "Success Rate");
        println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<15}", "", "", "", "");

        for &rps in &rps_stages {
            run_stage(&client, &target, rps).await;
        }
    }
}

async fn setup(client: &Client, base_url: &str) -> Fixture {
    let suffix = Uuid::new_v4().simple().to_string();
    let broker_slug = format!("bench-{}", &suffix[..12]);
    let email = format!("bench-{}@example.com", &suffix[..12]);

    let res = client.post(format!("{}/api/v1/brokers", base_url))
        .json(&json!({
            "business_name": "Benchmark Imóveis",
            "website_slug": broker_slug,
            "email": email,
        }))
        .send()
        .await
        .expect("Failed to send broker create request");

    if !res.status().is_success() {
        panic!("Failed to create broker: status {}", res.status());
    }

    let body: Value = res.json().await.expect("Failed to parse broker response");
    let broker_id = body["broker"]["id"].as_str().expect("No broker id").to_string();
    let secret = body["admin_secret"].as_str().expect("No admin_secret").to_string();

    let login_res = client.post(format!("{}/api/v1/auth/login", base_url))
        .json(&json!({ "email": email, "password": secret }))
        .send()
        .await
        .expect("Login failed during setup");

    if !login_res.status().is_success() {
        panic!("Login failed. Status: {}", login_res.status());
    }

    let auth_body: Value = login_res.json().await.expect("Failed to parse login response");
    let csrf_token = auth_body["csrf_token"].as_str().expect("No csrf_token").to_string();

    let property_slug = "casa-benchmark".to_string();
    let res = client.post(format!("{}/api/v1/{}/properties", base_url, broker_id))
        .header("X-CSRF-Token", &csrf_token)
        .json(&json!({
            "title": "Casa Benchmark",
            "slug": property_slug,
            "price": 450000.0,
            "property_type": "house",
            "transaction_type": "sale",
            "bedrooms": 3,
            "city": "Curitiba",
            "neighborhood": "Batel",
            "uf": "PR",
        }))
        .send()
        .await
        .expect("Failed to create property");

    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        panic!("Failed to create property data. Status: {}. Body: {}", status, txt);
    }

    Fixture { broker_id, broker_slug, property_slug }
}

async fn run_stage(client: &Client, target: &Target, rps: u32) {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(rps).expect("rps must be non-zero"))
    ));

    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(DURATION_SECS);

    loop {
        if start_time.elapsed() > duration {
            break;
        }

        if limiter.check().is_ok() {
            let client = client.clone();
            let url = target.url.clone();
            let body = target.body.clone();
            let headers = target.headers.clone();
            let method = target.method;
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let mut req = match method {
                    "POST" => client.post(&url),
                    _ => client.get(&url),
                };
                for (name, value) in headers {
                    req = req.header(name, value);
                }
                if let Some(b) = body {
                    req = req.json(&b);
                }
                let res = req.send().await;
                let latency = req_start.elapsed();

                let success = match res {
                    Ok(r) => r.status().is_success(),
                    Err(_) => false,
                };

                let _ = tx.send((latency, success)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).expect("valid histogram precision");
    let mut successes = 0;
    let mut total = 0;

    while let Some((latency, success)) = rx.recv().await {
        total += 1;
        if success { successes += 1; }
        let _ = histogram.record(latency.as_micros() as u64);
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let success_rate = if total > 0 { (successes as f64 / total as f64) * 100.0 } else { 0.0 };

    println!(
        "{:<10} | {:<15.2} | {:<15.2} | {:<14.1}%",
        rps,
        mean_ms,
        p99_ms,
        success_rate
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
}
