use std::time::Duration;

use tenable_http::{CancelToken, TenableClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let asset = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: findings <asset-name>"))?;

    let client = TenableClient::from_env().await?;

    // Give up on the whole aggregation after five minutes.
    let cancel =
        CancelToken::new().with_deadline(tokio::time::Instant::now() + Duration::from_secs(300));

    let asset_record = client.asset_by_name_with_cancel(&asset, &cancel).await?;
    println!("{} ({})", asset_record.name, asset_record.id);

    let findings = client
        .findings_by_asset_name_with_cancel(&asset, &cancel)
        .await?;
    for finding in findings {
        println!(
            "[{}] {}:{} {}",
            finding.severity, finding.protocol, finding.port, finding.definition.name
        );
    }

    Ok(())
}
