use serde::Serialize;

/// Connection target with the password removed, safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactedUrl {
    pub scheme: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub redacted: String,
}

const SECRET_PARAMS: &[&str] = &["password", "pass", "pwd", "ssl-key", "sslkey"];

/// Strip the password (userinfo and query parameters) from a `mysql://` URL.
pub fn redact_database_url(url: &str) -> RedactedUrl {
    let Some(scheme_end) = url.find("://") else {
        return RedactedUrl {
            scheme: None,
            user: None,
            host: None,
            port: None,
            database: None,
            redacted: redact_query(url),
        };
    };
    let scheme = &url[..scheme_end];
    let rest = &url[scheme_end + 3..];
    let (target, query) = match rest.split_once('?') {
        Some((target, query)) => (target, Some(query)),
        None => (rest, None),
    };

    // Passwords may contain '@', the last one ends the userinfo.
    let (userinfo, location) = match target.rfind('@') {
        Some(at) => (Some(&target[..at]), &target[at + 1..]),
        None => (None, target),
    };
    let user = userinfo.map(|info| info.split(':').next().unwrap_or_default().to_string());
    let has_password = userinfo.is_some_and(|info| info.contains(':'));

    let (host_port, database) = match location.split_once('/') {
        Some((host_port, db)) => (host_port, Some(db).filter(|db| !db.is_empty())),
        None => (location, None),
    };
    let (host, port) = match host_port.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().ok()),
        None => (host_port, None),
    };

    let mut redacted = format!("{scheme}://");
    if let Some(user) = &user {
        redacted.push_str(user);
        if has_password {
            redacted.push_str(":***");
        }
        redacted.push('@');
    }
    redacted.push_str(location);
    if let Some(query) = query {
        redacted.push('?');
        redacted.push_str(&redact_query(query));
    }

    RedactedUrl {
        scheme: Some(scheme.to_string()),
        user: user.filter(|user| !user.is_empty()),
        host: Some(host.to_string()).filter(|host| !host.is_empty()),
        port,
        database: database.map(str::to_string),
        redacted,
    }
}

fn redact_query(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SECRET_PARAMS.contains(&key.to_ascii_lowercase().as_str()) => {
                format!("{key}=***")
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}
