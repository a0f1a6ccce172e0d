//! Walk through the docsearch HTTP API against a running server.
//!
//! Set `DOCSEARCH_URL` (default `http://localhost:8080`) and `DOCSEARCH_API_KEY`
//! when the server has keys configured.

use reqwest::{Client, RequestBuilder};
use serde_json::json;

fn authed(builder: RequestBuilder, key: Option<&str>) -> RequestBuilder {
    match key {
        Some(key) => builder.header("X-API-Key", key),
        None => builder,
    }
}

async fn show(step: &str, builder: RequestBuilder) -> anyhow::Result<()> {
    println!("{step}:");
    let resp = builder.send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::var("DOCSEARCH_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let key = std::env::var("DOCSEARCH_API_KEY").ok();
    let key = key.as_deref();
    let client = Client::new();

    show("1. Liveness", client.get(format!("{base}/health"))).await?;
    show("2. Readiness", client.get(format!("{base}/ready"))).await?;
    show(
        "3. Vector store connectivity",
        authed(client.get(format!("{base}/pinecone/health")), key),
    )
    .await?;

    for (id, text) in [
        ("faq-1", "You can reset your password from the account settings page."),
        ("faq-2", "Invoices are emailed on the first business day of each month."),
        ("faq-3", "Two-factor authentication can be enabled under security settings."),
    ] {
        show(
            &format!("4. Store passage {id}"),
            authed(client.post(format!("{base}/pinecone/store-text")), key).json(&json!({
                "id": id,
                "text": text,
                "metadata": { "source": "faq" },
                "namespace": "help-center"
            })),
        )
        .await?;
    }

    show(
        "5. Semantic search",
        authed(client.post(format!("{base}/pinecone/search")), key).json(&json!({
            "query": "how do I change my password?",
            "topK": 2,
            "filter": { "source": { "$eq": "faq" } },
            "namespace": "help-center"
        })),
    )
    .await?;

    show(
        "6. Fetch by id",
        authed(client.post(format!("{base}/pinecone/fetch")), key).json(&json!({
            "ids": ["faq-1"],
            "namespace": "help-center"
        })),
    )
    .await?;

    show(
        "7. Namespaces",
        authed(client.get(format!("{base}/pinecone/namespaces")), key),
    )
    .await?;
    show(
        "8. Index stats",
        authed(client.get(format!("{base}/pinecone/index/stats")), key),
    )
    .await?;

    show(
        "9. Raw feature extraction",
        authed(client.post(format!("{base}/huggingface/extract-features")), key)
            .json(&json!({ "text": "hello world" })),
    )
    .await?;

    show(
        "10. Delete",
        authed(
            client.delete(format!(
                "{base}/pinecone/vectors?ids=faq-1,faq-2,faq-3&namespace=help-center"
            )),
            key,
        ),
    )
    .await?;

    Ok(())
}
