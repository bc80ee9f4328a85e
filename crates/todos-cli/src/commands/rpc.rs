use anyhow::Result;
use std::sync::Arc;
use tokio::io::BufReader;

use todos_application::TaskApi;
use todos_application::rpc::serve;

pub async fn run(api: TaskApi) -> Result<()> {
    serve(
        Arc::new(api),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    Ok(())
}
