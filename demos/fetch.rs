use std::time::Duration;

use fetch_retrier::{create_retrier, Request, RetrierOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let retrier = create_retrier(RetrierOptions::new().log(|entry| {
        println!(
            "[{}] attempt {} -> {} {}",
            entry.title, entry.attempt, entry.response.status, entry.response.status_text
        );
    }))?;

    println!("Successful fetch");
    let record = retrier
        .fetch(
            "https://jsonplaceholder.typicode.com/posts/1",
            Request::get().retrier_options(RetrierOptions::new().max_attempts(3)),
        )
        .await?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    tokio::time::sleep(Duration::from_secs(1)).await;

    println!("POST to a missing resource");
    let record = retrier
        .fetch(
            "https://jsonplaceholder.typicode.com/posts/9999999",
            Request::new(reqwest::Method::POST)
                .body(r#"{"lol":"lol"}"#)
                .retrier_options(RetrierOptions::new().max_attempts(3)),
        )
        .await?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}
