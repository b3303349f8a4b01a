//! Web server command.

use console::style;

use crate::config::Settings;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let (host, port) = match bind {
        Some(bind) => parse_bind_address(bind)?,
        None => bind_from_env()?,
    };

    println!(
        "{} Starting docverify server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!(
        "  Hugging Face token: {}",
        if settings.has_hf_token() {
            style("available").green()
        } else {
            style("not found").yellow()
        }
    );
    println!(
        "  Standard file: {} ({})",
        settings.standard_file.display(),
        if settings.standard_file.exists() {
            style("exists").green()
        } else {
            style("missing").red()
        }
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Bind address from `HOST` and `PORT`.
fn bind_from_env() -> anyhow::Result<(String, u16)> {
    let host = std::env::var("HOST")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match std::env::var("PORT").ok().filter(|p| !p.is_empty()) {
        Some(port) => port
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid PORT: {}", port))?,
        None => DEFAULT_PORT,
    };
    Ok((host, port))
}

/// Parse a bind address that can be:
/// - Just a port: "8000" -> 0.0.0.0:8000
/// - Just a host: "127.0.0.1" -> 127.0.0.1:8000
/// - Host and port: "127.0.0.1:9000" -> 127.0.0.1:9000
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok((DEFAULT_HOST.to_string(), port));
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    // Must be just a host, use default port
    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(
            parse_bind_address("9000").unwrap(),
            ("0.0.0.0".to_string(), 9000)
        );
        assert_eq!(
            parse_bind_address("127.0.0.1").unwrap(),
            ("127.0.0.1".to_string(), 8000)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0:8000").unwrap(),
            ("0.0.0.0".to_string(), 8000)
        );
        assert!(parse_bind_address("").is_err());
    }
}
