//! Minimal end-to-end run over the offline demo backend.
//!
//! ```sh
//! cargo run --example demo
//! ```

use dugong_core::Message;
use dugong_provider::{ProviderRegistry, RegistryConfig};
use dugong_runtime::{SubmitRequest, TaskManager};
use futures_util::StreamExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let registry = ProviderRegistry::new(&RegistryConfig::default())?;
    let manager = TaskManager::new(registry);
    manager.start().await;

    let task = manager
        .submit(SubmitRequest::new(
            "demo/echo",
            vec![Message::user("hello there")],
        ))
        .await?;
    println!("submitted {}", task.id);

    let mut stream = std::pin::pin!(manager.open_stream(&task.id, None)?);
    while let Some(event) = stream.next().await {
        println!("event {}: {}", event.sequence_number, event.payload);
    }

    let task = manager.retrieve(&task.id).expect("task exists");
    println!("{:?}: {}", task.status, task.output_text.unwrap_or_default());

    manager.stop().await;
    Ok(())
}
