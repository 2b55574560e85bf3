use std::{path::Path, sync::Arc};

use bytes::Bytes;
use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use http::{HeaderName, HeaderValue, Method};
use http_interceptor::{
    HttpClientAdapter, RequestOptions,
    adapters::factory::build_interceptor_service,
    config::{ClientConfigValidator, loader::load_config_or_default},
    metrics, tracing_setup,
};
use tracing::Instrument;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Send one request through the configured interceptor chain
    Fetch {
        /// Absolute http:// or https:// URL
        url: String,
        /// HTTP method
        #[clap(short = 'X', long, default_value = "GET")]
        method: String,
        /// Extra header, `name: value` (repeatable)
        #[clap(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Request body
        #[clap(short = 'd', long)]
        data: Option<String>,
        /// Configuration file (defaults are used when omitted)
        #[clap(short, long)]
        config: Option<String>,
        /// Print response headers
        #[clap(short = 'i', long)]
        include_headers: bool,
    },
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "interceptor.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "interceptor.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Commands::Fetch {
            url,
            method,
            headers,
            data,
            config,
            include_headers,
        } => {
            let options = build_request_options(&method, &headers, data)?;
            fetch_command(&url, options, config.as_deref(), include_headers).await
        }
        Commands::Validate { config } => validate_config_command(&config).await,
        Commands::Init { config } => init_config_command(&config).await,
    }
}

/// Turn the command line flags into request options.
fn build_request_options(
    method: &str,
    headers: &[String],
    data: Option<String>,
) -> Result<RequestOptions> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|e| eyre!("Invalid method '{}': {}", method, e))?;
    let mut options = RequestOptions::new().with_method(method);

    for raw in headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| eyre!("Header '{}' is not in 'name: value' form", raw))?;
        let name = HeaderName::try_from(name.trim())
            .wrap_err_with(|| format!("Invalid header name in '{raw}'"))?;
        let value = HeaderValue::from_str(value.trim())
            .wrap_err_with(|| format!("Invalid header value in '{raw}'"))?;
        options = options.with_header(name, value);
    }

    if let Some(data) = data {
        options = options.with_body(Bytes::from(data));
    }
    Ok(options)
}

async fn fetch_command(
    url: &str,
    options: RequestOptions,
    config_path: Option<&str>,
    include_headers: bool,
) -> Result<()> {
    let config = load_config_or_default(config_path).await?;

    if let Err(e) = tracing_setup::init_from_config(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }
    metrics::init_metrics()?;

    let client = HttpClientAdapter::from_config(&config.transport)
        .wrap_err("Failed to create HTTP client")?;
    let service = build_interceptor_service(&config, Arc::new(client))?;

    let span = tracing_setup::create_invocation_span("fetch");
    let result = service
        .request(url, Some(options))
        .instrument(span)
        .await
        .wrap_err_with(|| format!("Request to {url} failed"))?;

    let Some(response) = result else {
        println!("Request completed by an interceptor without a response");
        return Ok(());
    };

    println!("{:?} {}", response.version(), response.status());
    if include_headers {
        for (name, value) in response.headers() {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        println!();
    }
    if !response.body().is_empty() {
        println!("{}", String::from_utf8_lossy(response.body()));
    }
    Ok(())
}

/// Validate a configuration file
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config_or_default(Some(config_path)).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    match ClientConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!(
                "   • Timeout: {}",
                config.transport.timeout.as_deref().unwrap_or("none")
            );
            println!("   • Default headers: {}", config.headers.len());
            println!("   • Request IDs: {}", config.request_id.enabled);
            println!("   • Timing: {}", config.timing.enabled);
            println!("   • Fail on error status: {}", config.fail_on_error_status);
            println!(
                "   • Retries: {}",
                config.retry.as_ref().map_or(0, |r| r.max_retries)
            );
            println!("   • Stubs: {}", config.stubs.len());
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Ensure stub prefixes start with http:// or https://");
            println!("   • Use humantime durations for the timeout (e.g. '30s', '1m 30s')");
            println!("   • Keep retry.base_delay_ms below retry.max_delay_ms");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# HTTP interceptor client configuration

# Turn non-2xx responses into errors
fail_on_error_status = false

[transport]
timeout = "30s"

# Headers added to every request that does not carry them
[headers]
accept = "application/json"

[request_id]
enabled = true
header = "x-request-id"

[timing]
enabled = true

# Retry idempotent requests on connection errors, timeouts and these statuses
# [retry]
# max_retries = 3
# base_delay_ms = 100
# max_delay_ms = 2000
# retry_on_status = [502, 503, 504]

# Canned responses, longest URL prefix wins
# [stubs."http://localhost:8080/health"]
# status = 200
# body = '{"status":"ok"}'
# content_type = "application/json"

[logging]
level = "info"
json = false
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'http-interceptor fetch --config {config_path} <url>' to send a request");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_options() {
        let options = build_request_options(
            "post",
            &["x-api-key: secret".to_string()],
            Some("{}".to_string()),
        )
        .unwrap();
        assert_eq!(options.method, Method::POST);
        assert_eq!(options.headers["x-api-key"], "secret");
        assert_eq!(options.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        assert!(build_request_options("GET", &["no-colon".to_string()], None).is_err());
    }
}
