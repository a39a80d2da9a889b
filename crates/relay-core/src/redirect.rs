//! # Redirect Bridge
//!
//! Stripe only accepts web URLs as `success_url`/`cancel_url`, but the mobile
//! app is reached through a custom scheme (`myapp://...`, `exp://...`).
//! The bridge receives the web redirect and hands the browser an HTML page
//! that navigates on to the app, carrying the payment status along.
//!
//! ```text
//!  Stripe ──302──▶ /return?status=success&to=myapp://checkout
//!                       │
//!                       ▼
//!              HTML: meta refresh + location.replace + <a href>
//!                       │
//!                       ▼
//!              myapp://checkout?status=success
//! ```

use crate::error::{RelayError, RelayResult};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Status used when the redirect carries no usable `status` value
pub const UNKNOWN_STATUS: &str = "unknown";

/// Content type of the bridge page
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

// =============================================================================
// Request
// =============================================================================

/// One inbound bridge navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRequest {
    /// Free-form outcome label (`success`, `cancel`, ...)
    pub status: String,
    /// Caller-supplied locator, usually an app deep link
    pub destination: String,
}

impl RedirectRequest {
    pub fn new(status: Option<&str>, destination: impl Into<String>) -> Self {
        Self {
            status: status.unwrap_or(UNKNOWN_STATUS).to_string(),
            destination: destination.into(),
        }
    }

    /// Build from decoded query pairs.
    ///
    /// A key given more than once has no single string value: a repeated
    /// `status` falls back to `unknown` and a repeated `to` counts as missing.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut status = Vec::new();
        let mut to = Vec::new();

        for (key, value) in pairs {
            match key.as_ref() {
                "status" => status.push(value.into()),
                "to" => to.push(value.into()),
                _ => {}
            }
        }

        Self {
            status: single(status).unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
            destination: single(to).unwrap_or_default(),
        }
    }

    /// Final locator: the destination with `status=<encoded>` appended.
    pub fn target(&self) -> RelayResult<String> {
        if self.destination.is_empty() {
            return Err(RelayError::MissingDestination);
        }

        let separator = if self.destination.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}status={}",
            self.destination,
            separator,
            urlencoding::encode(&self.status)
        ))
    }
}

fn single(mut values: Vec<String>) -> Option<String> {
    if values.len() == 1 {
        values.pop()
    } else {
        None
    }
}

// =============================================================================
// Allow-list
// =============================================================================

/// A single allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowRule {
    /// `myapp` admits every `myapp:` destination
    Scheme(String),
    /// `https://example.com` admits only that scheme on that host
    SchemeHost { scheme: String, host: String },
}

impl AllowRule {
    fn matches(&self, scheme: &str, host: Option<&str>) -> bool {
        match self {
            AllowRule::Scheme(s) => s == scheme,
            AllowRule::SchemeHost { scheme: s, host: h } => {
                s == scheme && host.map(|host| host.eq_ignore_ascii_case(h)).unwrap_or(false)
            }
        }
    }
}

impl FromStr for AllowRule {
    type Err = RelayError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let entry = entry.trim();
        let invalid = |reason: &str| {
            RelayError::Configuration(format!("{} in allow-list entry '{}'", reason, entry))
        };

        let Some((scheme, _)) = entry.split_once("://") else {
            let scheme = entry.trim_end_matches(':');
            if !is_valid_scheme(scheme) {
                return Err(invalid("invalid scheme"));
            }
            return Ok(AllowRule::Scheme(scheme.to_ascii_lowercase()));
        };
        if !is_valid_scheme(scheme) {
            return Err(invalid("invalid scheme"));
        }

        // Destinations are matched on scheme and host only, so anything
        // after the host would make the rule unmatchable.
        let url = Url::parse(entry).map_err(|_| invalid("unparseable URL"))?;
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => return Err(invalid("empty host")),
        };
        if url.port().is_some() {
            return Err(invalid("port"));
        }
        if !matches!(url.path(), "" | "/") {
            return Err(invalid("path"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query or fragment"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials"));
        }

        Ok(AllowRule::SchemeHost {
            scheme: url.scheme().to_string(),
            host,
        })
    }
}

impl fmt::Display for AllowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowRule::Scheme(scheme) => write!(f, "{}", scheme),
            AllowRule::SchemeHost { scheme, host } => write!(f, "{}://{}", scheme, host),
        }
    }
}

// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Schemes and hosts a destination is allowed to point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationAllowList {
    rules: Vec<AllowRule>,
}

impl DestinationAllowList {
    pub fn new(rules: Vec<AllowRule>) -> RelayResult<Self> {
        if rules.is_empty() {
            return Err(RelayError::Configuration(
                "destination allow-list must not be empty".to_string(),
            ));
        }
        Ok(Self { rules })
    }

    /// Parse a comma-separated list such as `myapp,exp,https://example.com`.
    pub fn parse(list: &str) -> RelayResult<Self> {
        let rules = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(AllowRule::from_str)
            .collect::<RelayResult<Vec<_>>>()?;
        Self::new(rules)
    }

    pub fn rules(&self) -> &[AllowRule] {
        &self.rules
    }

    /// Whether `destination` is an absolute URI matching some rule.
    pub fn permits(&self, destination: &str) -> bool {
        let Ok(parsed) = Url::parse(destination) else {
            return false;
        };
        let scheme = parsed.scheme();
        let host = parsed.host_str();

        self.rules.iter().any(|rule| rule.matches(scheme, host))
    }

    pub fn check(&self, destination: &str) -> RelayResult<()> {
        if self.permits(destination) {
            Ok(())
        } else {
            Err(RelayError::DestinationNotAllowed {
                destination: destination.to_string(),
            })
        }
    }
}

// =============================================================================
// Page
// =============================================================================

/// The HTML document that sends the browser on to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPage {
    target: String,
}

impl RedirectPage {
    /// Validate the request and compute its final locator.
    ///
    /// A missing destination is reported before the allow-list is consulted.
    pub fn for_request(
        request: &RedirectRequest,
        allow_list: &DestinationAllowList,
    ) -> RelayResult<Self> {
        let target = request.target()?;
        allow_list.check(&request.destination)?;
        Ok(Self { target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Render the page. Meta refresh, script and link all point at the same
    /// locator.
    pub fn render(&self) -> RelayResult<String> {
        let href = escape_html(&self.target);
        // The refresh URL sits inside single quotes; HTML entities are
        // decoded before the content is parsed, so `'` must be percent-encoded.
        let refresh = escape_html(&self.target.replace('\'', "%27"));
        let script_target = script_literal(&self.target)?;

        Ok(format!(
            r#"<!DOCTYPE html><html><head><meta charset="utf-8" />
<meta http-equiv="refresh" content="0;url='{refresh}'" />
<title>Returning to the app…</title>
<script>window.location.replace({script_target});</script>
</head><body>
<p>Redirecting… If nothing happens, <a href="{href}">tap here</a>.</p>
</body></html>"#
        ))
    }
}

/// Escape text for use inside a quoted HTML attribute.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// JSON string literal that cannot close the surrounding `<script>`.
fn script_literal(input: &str) -> RelayResult<String> {
    let literal = serde_json::to_string(input)
        .map_err(|e| RelayError::Internal(format!("failed to encode redirect target: {}", e)))?;
    Ok(literal.replace('<', "\\u003c").replace('>', "\\u003e"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(list: &str) -> DestinationAllowList {
        DestinationAllowList::parse(list).unwrap()
    }

    #[test]
    fn test_target_without_query() {
        let req = RedirectRequest::new(Some("success"), "app://checkout");
        assert_eq!(req.target().unwrap(), "app://checkout?status=success");
    }

    #[test]
    fn test_target_with_existing_query() {
        let req = RedirectRequest::new(None, "app://checkout?ref=1");
        assert_eq!(req.target().unwrap(), "app://checkout?ref=1&status=unknown");
    }

    #[test]
    fn test_target_encodes_status() {
        let req = RedirectRequest::new(Some("paid in full/ok"), "app://checkout");
        assert_eq!(
            req.target().unwrap(),
            "app://checkout?status=paid%20in%20full%2Fok"
        );
    }

    #[test]
    fn test_empty_status_is_kept() {
        let req = RedirectRequest::from_query_pairs([("status", ""), ("to", "app://x")]);
        assert_eq!(req.status, "");
        assert_eq!(req.target().unwrap(), "app://x?status=");
    }

    #[test]
    fn test_missing_destination() {
        let req = RedirectRequest::new(Some("success"), "");
        assert!(matches!(req.target(), Err(RelayError::MissingDestination)));
    }

    #[test]
    fn test_repeated_params_are_not_strings() {
        let req = RedirectRequest::from_query_pairs([
            ("status", "success"),
            ("status", "cancel"),
            ("to", "app://checkout"),
        ]);
        assert_eq!(req.status, UNKNOWN_STATUS);
        assert_eq!(req.destination, "app://checkout");

        let req = RedirectRequest::from_query_pairs([("to", "app://a"), ("to", "app://b")]);
        assert!(req.destination.is_empty());
    }

    #[test]
    fn test_allow_rule_parsing() {
        assert_eq!(
            "MyApp".parse::<AllowRule>().unwrap(),
            AllowRule::Scheme("myapp".to_string())
        );
        assert_eq!(
            "https://Pay.Example.com/".parse::<AllowRule>().unwrap(),
            AllowRule::SchemeHost {
                scheme: "https".to_string(),
                host: "pay.example.com".to_string()
            }
        );
        assert!("1app".parse::<AllowRule>().is_err());
        assert!("https://".parse::<AllowRule>().is_err());
    }

    #[test]
    fn test_allow_rule_rejects_more_than_host() {
        for entry in [
            "https://pay.example.com:8443",
            "https://pay.example.com/app",
            "myapp://host/path",
            "myapp://host:9000",
            "https://pay.example.com/?x=1",
            "https://user@pay.example.com",
        ] {
            assert!(
                matches!(entry.parse::<AllowRule>(), Err(RelayError::Configuration(_))),
                "{} should be rejected",
                entry
            );
        }
        assert!(DestinationAllowList::parse("app,https://pay.example.com:8443").is_err());

        assert_eq!(
            "myapp://Host".parse::<AllowRule>().unwrap(),
            AllowRule::SchemeHost {
                scheme: "myapp".to_string(),
                host: "host".to_string()
            }
        );
    }

    #[test]
    fn test_allow_list_rejects_empty() {
        assert!(DestinationAllowList::parse("").is_err());
        assert!(DestinationAllowList::parse(" , ").is_err());
    }

    #[test]
    fn test_allow_list_schemes() {
        let list = allow("app, exp");
        assert!(list.permits("app://checkout"));
        assert!(list.permits("APP://checkout?ref=1"));
        assert!(list.permits("exp://192.168.1.5:8081/--/checkout"));
        assert!(!list.permits("https://evil.example/steal"));
        assert!(!list.permits("javascript:alert(1)"));
        assert!(!list.permits("checkout"));
    }

    #[test]
    fn test_allow_list_hosts() {
        let list = allow("https://pay.example.com");
        assert!(list.permits("https://pay.example.com/done"));
        assert!(!list.permits("https://pay.example.com.evil.io/done"));
        assert!(!list.permits("http://pay.example.com/done"));
    }

    #[test]
    fn test_page_checks_missing_before_allow_list() {
        let list = allow("app");
        let req = RedirectRequest::new(None, "");
        assert!(matches!(
            RedirectPage::for_request(&req, &list),
            Err(RelayError::MissingDestination)
        ));

        let req = RedirectRequest::new(None, "evil://x");
        assert!(matches!(
            RedirectPage::for_request(&req, &list),
            Err(RelayError::DestinationNotAllowed { .. })
        ));
    }

    #[test]
    fn test_render_contains_all_redirects() {
        let req = RedirectRequest::new(Some("success"), "app://checkout");
        let page = RedirectPage::for_request(&req, &allow("app")).unwrap();
        let html = page.render().unwrap();

        assert!(html.contains(r#"content="0;url='app://checkout?status=success'""#));
        assert!(html.contains(r#"window.location.replace("app://checkout?status=success");"#));
        assert!(html.contains(r#"<a href="app://checkout?status=success">"#));
    }

    #[test]
    fn test_render_escapes_markup() {
        let req = RedirectRequest::new(Some("ok"), "app://x?q='</script><b>");
        let page = RedirectPage::for_request(&req, &allow("app")).unwrap();
        let html = page.render().unwrap();

        assert!(!html.contains("</script><b>"));
        assert!(html.contains(r#"<a href="app://x?q=&#39;&lt;/script&gt;&lt;b&gt;"#));
        assert!(html.contains(r"'\u003c/script\u003e\u003cb\u003e"));
    }

    #[test]
    fn test_render_quote_does_not_end_refresh_url() {
        let req = RedirectRequest::new(Some("ok"), "app://x?name=o'brien");
        let page = RedirectPage::for_request(&req, &allow("app")).unwrap();
        let html = page.render().unwrap();

        assert!(html.contains(r#"content="0;url='app://x?name=o%27brien&amp;status=ok'""#));
        assert!(html.contains(r#"<a href="app://x?name=o&#39;brien&amp;status=ok">"#));
        assert!(html.contains(r#"window.location.replace("app://x?name=o'brien&status=ok");"#));
    }

    #[test]
    fn test_render_is_deterministic() {
        let req = RedirectRequest::new(Some("cancel"), "app://checkout?ref=1");
        let page = RedirectPage::for_request(&req, &allow("app")).unwrap();
        assert_eq!(page.render().unwrap(), page.render().unwrap());
    }
}
