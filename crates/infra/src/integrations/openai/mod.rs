/// OpenAI integration for the scheduling assistant
///
/// The agent only needs free-text answers for general questions it cannot
/// resolve from its knowledge base. `OpenAIClient` wraps the Chat Completions
/// API behind the `LanguageModel` port.
///
/// # Usage
///
/// ```no_run
/// use slotwise_infra::http::HttpClient;
/// use slotwise_infra::integrations::openai::OpenAIClient;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let http_client = HttpClient::new()?;
/// let api_key = std::env::var("OPENAI_API_KEY")?;
/// let client = OpenAIClient::new(api_key, http_client);
///
/// let answer = client.chat("You are a scheduling assistant.", "When should I meet?").await?;
/// println!("{answer}");
/// # Ok(())
/// # }
/// ```
///
/// # Error Handling
///
/// - **Network errors**: retried by `HttpClient`
/// - **Server errors (5xx)**: retried with exponential backoff
/// - **401/403**: reported as authentication failures
/// - **429**: reported as a rate limit with a 60s hint
pub mod client;
pub mod types;

pub use client::OpenAIClient;
pub use types::OpenAIError;
