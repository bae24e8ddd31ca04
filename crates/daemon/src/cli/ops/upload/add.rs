use std::path::PathBuf;

use clap::Args;

use depot_daemon::http_server::api::client::ApiError;
use depot_daemon::http_server::api::v0::upload::CreateRequest;

use super::format_record;

#[derive(Args, Debug, Clone)]
pub struct Add {
    /// File to upload
    pub file: PathBuf,

    /// Upload under this filename instead of the file's own name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadAddError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("{0} has no file name")]
    NoFileName(PathBuf),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Add {
    type Error = UploadAddError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let filename = match &self.name {
            Some(name) => name.clone(),
            None => self
                .file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| UploadAddError::NoFileName(self.file.clone()))?,
        };
        let data = tokio::fs::read(&self.file)
            .await
            .map_err(|e| UploadAddError::Read(self.file.clone(), e))?;

        let response = ctx.client.call(CreateRequest { filename, data }).await?;
        Ok(format!("Uploaded\n{}", format_record(&response.upload)))
    }
}
