/*
[INPUT]:  Stream URL and optional bearer token from the environment
[OUTPUT]: Live task-status frames printed to stdout
[POS]:    Examples - WebSocket stream handling
[UPDATE]: When WebSocket API changes
*/

use scan_status_adapter::*;

/// Example: print every task-status frame from the live stream
///
/// SCAN_STREAM_URL (default ws://127.0.0.1:8000/api/v1/tasks/stream)
/// SCAN_TOKEN      (optional bearer token)
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("SCAN_STREAM_URL")
        .unwrap_or_else(|_| "ws://127.0.0.1:8000/api/v1/tasks/stream".to_string());
    let credential = std::env::var("SCAN_TOKEN").ok().map(Credential::new);

    let ws = StatusWebSocket::with_url(&url, 50)?;
    let mut channel = ws.open(credential.as_ref());
    println!("Connecting to {}", ws.stream_url_for(None));

    while let Some(event) = channel.recv().await {
        match event {
            StreamEvent::Connected => println!("connected"),
            StreamEvent::Frame(raw) => match parse_status_frame(&raw) {
                Ok(StatusFrame::TaskStatus(tasks)) => {
                    println!("{} tasks", tasks.len());
                    for task in &tasks {
                        println!("  #{:<6} {:<10} {}", task.id, task.status, task.display_name());
                    }
                }
                Ok(StatusFrame::Other(kind)) => println!("ignored message kind {kind}"),
                Err(err) => println!("malformed frame: {err}"),
            },
            StreamEvent::Failed(reason) => {
                println!("stream failed: {reason}");
                break;
            }
            StreamEvent::Closed(reason) => {
                println!("stream closed: {}", reason.unwrap_or_default());
                break;
            }
        }
    }

    Ok(())
}
