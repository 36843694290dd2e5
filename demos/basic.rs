use intercept_http::{BackoffInterceptor, ClientOptions, Dispatcher, InterceptorChain, MaxAttempts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("INTERCEPT_HTTP_URL")
        .unwrap_or_else(|_| "https://jsonplaceholder.typicode.com/todos/1".to_owned());

    let policy = InterceptorChain::new().with(BackoffInterceptor::new(3, 200));
    let dispatcher = Dispatcher::new()
        .with_options(ClientOptions {
            timeout_ms: 5_000,
            ..ClientOptions::default()
        })
        .with_interceptor(MaxAttempts::new(policy, 4));

    let body = dispatcher
        .get(&url, &[("accept", "application/json")])
        .await?;

    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}
