use clap::{Args, Subcommand};

pub mod add;
pub mod audit;
pub mod get;
pub mod info;
pub mod ls;
pub mod rm;

use crate::cli::op::Op;

crate::command_enum! {
    (Ls, ls::Ls),
    (Add, add::Add),
    (Info, info::Info),
    (Get, get::Get),
    (Rm, rm::Rm),
    (Audit, audit::Audit),
}

pub type UploadCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Upload {
    #[command(subcommand)]
    pub command: UploadCommand,
}

#[async_trait::async_trait]
impl Op for Upload {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// One line per record: id, filename, size, timestamp.
pub(crate) fn format_record(record: &depot_store::ArtifactRecord) -> String {
    let created_at = record
        .created_at
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| record.created_at.to_string());
    format!(
        "{}  {}  {} bytes  {}",
        record.id,
        record.filename(),
        record.size,
        created_at
    )
}
