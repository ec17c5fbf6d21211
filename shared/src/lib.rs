pub mod auth;
pub mod config;
pub mod email;
pub mod fetch;
pub mod image_proxy;
pub mod ingest;
pub mod notify;
pub mod storage;
pub mod transform;
pub mod types;

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sesv2::Client as SesClient;

/// Shared per-invocation state built once at cold start.
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub s3_client: S3Client,
    pub ses_client: SesClient,
    pub fetch_clients: fetch::FetchClients,
    pub config: config::PipelineConfig,
}
