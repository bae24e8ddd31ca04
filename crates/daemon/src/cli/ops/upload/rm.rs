use clap::Args;

use depot_daemon::http_server::api::client::ApiError;
use depot_daemon::http_server::api::v0::upload::DeleteRequest;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    #[command(flatten)]
    pub request: DeleteRequest,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.request.clone()).await?;
        Ok(format!("Deleted {}", response.id))
    }
}
