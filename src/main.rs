//! Proofdesk server binary.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    proofdesk::server::run().await
}
