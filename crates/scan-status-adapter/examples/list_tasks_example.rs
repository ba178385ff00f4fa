/*
[INPUT]:  API base URL and bearer token from the environment
[OUTPUT]: Recent scan tasks printed to stdout
[POS]:    Examples - REST task listing
[UPDATE]: When task endpoints change
*/

use scan_status_adapter::*;

/// Example: list recent tasks over REST
///
/// SCAN_API_BASE (default http://127.0.0.1:8000)
/// SCAN_TOKEN    (bearer token)
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let base = std::env::var("SCAN_API_BASE").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    let credential = std::env::var("SCAN_TOKEN").ok().map(Credential::new);

    let client = ScanClient::with_config_and_base_url(ClientConfig::default(), &base)?;
    let tasks = client
        .list_tasks(credential.as_ref(), TaskQuery::with_limit(20))
        .await?;

    for task in &tasks {
        println!(
            "#{:<6} {:<10} {:<20} created {}",
            task.id,
            task.status,
            task.display_name(),
            task.created_at
        );
    }
    Ok(())
}
