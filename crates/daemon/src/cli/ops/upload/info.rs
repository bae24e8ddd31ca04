use clap::Args;

use depot_daemon::http_server::api::client::ApiError;
use depot_daemon::http_server::api::v0::upload::GetRequest;

use super::format_record;

#[derive(Args, Debug, Clone)]
pub struct Info {
    #[command(flatten)]
    pub request: GetRequest,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Info {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.request.clone()).await?;
        Ok(format_record(&response.upload))
    }
}
