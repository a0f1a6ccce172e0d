use std::{env, sync::Arc};

use semantic::{EmbeddingClient, EmbeddingConfig, EmbeddingService, ExtractorMode};

/// Embeds a query and a few passages. Uses the Hugging Face endpoint when `HF_API_TOKEN`
/// is set, the offline stub otherwise.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let query = env::args()
        .nth(1)
        .unwrap_or_else(|| "how do I reset my password?".into());

    let cfg = match env::var("HF_API_TOKEN") {
        Ok(token) => EmbeddingConfig {
            api_token: Some(token),
            expected_dimension: Some(1024),
            ..Default::default()
        },
        Err(_) => {
            println!("HF_API_TOKEN not set, using the deterministic stub backend");
            EmbeddingConfig {
                mode: ExtractorMode::Stub,
                stub_dimension: 16,
                ..Default::default()
            }
        }
    };

    let client = EmbeddingClient::from_config(&cfg)?;
    let service = EmbeddingService::new(Arc::new(client));

    let embedded = service.embed_query(&query).await?;
    println!("query: {}", embedded.text);
    println!("model: {}", embedded.model);
    println!("dim: {}", embedded.metadata.dimensions);
    println!("magnitude before normalization: {:.4}", embedded.metadata.magnitude);
    println!(
        "first values: {:?}",
        &embedded.vector[..embedded.vector.len().min(8)]
    );

    let passages = [
        "Passwords can be reset from the account settings page.",
        "   ",
        "Invoices are sent on the first business day of the month.",
    ];
    let batch = service.embed_passages(&passages).await?;
    println!(
        "passages: {} embedded, {} failed",
        batch.successes().count(),
        batch.failed_count()
    );
    for (index, error) in batch.failures() {
        println!("  passage {index}: {error}");
    }

    Ok(())
}
