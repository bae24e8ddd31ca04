use clap::Args;

use depot_daemon::http_server::api::client::ApiError;
use depot_daemon::http_server::api::v0::upload::AuditRequest;

use super::format_record;

#[derive(Args, Debug, Clone)]
pub struct Audit;

#[async_trait::async_trait]
impl crate::cli::op::Op for Audit {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let report = ctx.client.call(AuditRequest).await?;
        if report.is_consistent() {
            return Ok("Catalog and blob store agree".to_string());
        }

        let mut lines = Vec::new();
        if !report.orphan_records.is_empty() {
            lines.push(format!("Records without a blob ({}):", report.orphan_records.len()));
            lines.extend(report.orphan_records.iter().map(|r| format!("  {}", format_record(r))));
        }
        if !report.orphan_blobs.is_empty() {
            lines.push(format!("Blobs without a record ({}):", report.orphan_blobs.len()));
            lines.extend(report.orphan_blobs.iter().map(|key| format!("  {}", key)));
        }
        Ok(lines.join("\n"))
    }
}
