use clap::Args;

use depot_daemon::http_server::api::client::ApiError;
use depot_daemon::http_server::api::v0::upload::ListRequest;

use super::format_record;

#[derive(Args, Debug, Clone)]
pub struct Ls;

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(ListRequest).await?;

        if response.uploads.is_empty() {
            return Ok("No uploads found".to_string());
        }
        Ok(response
            .uploads
            .iter()
            .map(format_record)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
