//! Request command implementation.

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use colored::Colorize;

use sesh_http::{ApiRequest, Method};

use crate::output;
use crate::state;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method
    #[arg(value_enum, ignore_case = true)]
    pub method: HttpMethod,

    /// Path relative to the API base URL, e.g. /news/
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,
}

pub async fn run(api: &str, args: RequestArgs) -> Result<()> {
    let client = state::open_client(api)?;

    let mut request = ApiRequest::new(args.method.into(), args.path);
    if let Some(data) = &args.data {
        let body = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.with_body(body);
    }

    let response = client
        .send(&request)
        .await
        .with_context(|| format!("{} {} failed", request.method(), request.path()))?;

    eprintln!("{}", response.status().to_string().dimmed());
    output::body(response.body())?;

    if !response.status().is_success() {
        bail!("Server answered {}", response.status());
    }

    Ok(())
}
