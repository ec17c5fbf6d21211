mod http_handler;

use std::sync::Arc;

use lambda_http::{run, service_fn, Error};
use repvendas_shared::{config::PipelineConfig, fetch::FetchClients, AppState};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let config = PipelineConfig::from_env();
    let fetch_clients = FetchClients::new(&config.fetch).map_err(Error::from)?;

    let state = Arc::new(AppState {
        dynamo_client: aws_sdk_dynamodb::Client::new(&aws_config),
        s3_client: aws_sdk_s3::Client::new(&aws_config),
        ses_client: aws_sdk_sesv2::Client::new(&aws_config),
        fetch_clients,
        config,
    });

    run(service_fn(move |event| {
        http_handler::function_handler(event, state.clone())
    }))
    .await
}
