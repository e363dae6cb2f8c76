// ABOUTME: Target address parsing for the remote device.
// ABOUTME: Parses formats like "host", "user@host", "host:port", "user@host:port".

/// A parsed target. Port and user are only set when written explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
}

impl Target {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("target address cannot be empty".to_string());
        }

        // Parse format: [user@]host[:port]
        let (user_part, rest) = match s.rfind('@') {
            Some(at_pos) => (Some(&s[..at_pos]), &s[at_pos + 1..]),
            None => (None, s),
        };

        if user_part.is_some_and(str::is_empty) {
            return Err("user cannot be empty".to_string());
        }

        let (host, port) = split_host_port(rest)?;

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(Target {
            host: host.to_string(),
            port,
            user: user_part.map(|s| s.to_string()),
        })
    }
}

/// Split `host[:port]`, accepting bracketed IPv6 (`[::1]:22`) and bare IPv6 without a port.
fn split_host_port(rest: &str) -> Result<(&str, Option<u16>), String> {
    if let Some(inner) = rest.strip_prefix('[') {
        let close = inner
            .find(']')
            .ok_or_else(|| format!("unterminated '[' in {}", rest))?;
        let host = &inner[..close];
        let after = &inner[close + 1..];
        return match after.strip_prefix(':') {
            Some(port_str) => Ok((host, Some(parse_port(port_str)?))),
            None if after.is_empty() => Ok((host, None)),
            None => Err(format!("unexpected text after ']': {}", after)),
        };
    }

    // More than one colon and no brackets: a bare IPv6 address.
    if rest.matches(':').count() > 1 {
        return Ok((rest, None));
    }

    match rest.rfind(':') {
        Some(colon_pos) => Ok((&rest[..colon_pos], Some(parse_port(&rest[colon_pos + 1..])?))),
        None => Ok((rest, None)),
    }
}

fn parse_port(port_str: &str) -> Result<u16, String> {
    port_str
        .parse::<u16>()
        .map_err(|_| format!("invalid port: {}", port_str))
}
