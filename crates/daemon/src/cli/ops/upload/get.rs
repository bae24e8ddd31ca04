use std::path::PathBuf;

use clap::Args;

use depot_daemon::http_server::api::client::ApiError;
use depot_daemon::http_server::api::v0::upload::{ContentRequest, GetRequest};
use depot_store::ArtifactId;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Upload id
    pub id: ArtifactId,

    /// Where to write the bytes (defaults to the upload's filename)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadGetError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = UploadGetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let output = match &self.output {
            Some(path) => path.clone(),
            None => {
                let record = ctx.client.call(GetRequest { id: self.id }).await?.upload;
                PathBuf::from(record.filename())
            }
        };

        let request = ContentRequest { id: self.id }
            .build_request(ctx.client.base_url(), ctx.client.http_client());
        let data = ctx.client.call_raw(request).await?;

        tokio::fs::write(&output, &data)
            .await
            .map_err(|e| UploadGetError::Write(output.clone(), e))?;
        Ok(format!("Wrote {} bytes to {}", data.len(), output.display()))
    }
}
