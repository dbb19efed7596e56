//! Raw request command implementation.

use anyhow::{Context, Result};
use clap::Args;

use palaver::client::Method;
use palaver::{ApiRequest, Session};

use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PATCH, PUT, DELETE)
    pub method: String,

    /// Endpoint path, e.g. /api/chats/
    pub endpoint: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,
}

pub async fn run(session: &Session, args: RequestArgs) -> Result<()> {
    let method =
        Method::from_bytes(args.method.to_uppercase().as_bytes()).context("Invalid HTTP method")?;
    let mut request = ApiRequest::new(method, &args.endpoint);

    if let Some(data) = &args.data {
        let body: serde_json::Value = serde_json::from_str(data).context("Invalid JSON body")?;
        request = request.json(&body)?;
    }

    let response = session
        .client()
        .execute(&request)
        .await
        .with_context(|| format!("{} {} failed", args.method.to_uppercase(), args.endpoint))?;

    if !response.body.is_null() {
        output::json_pretty(&response.body)?;
    }

    Ok(())
}
