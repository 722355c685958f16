//! Publisher identity: collapse email-style bylines onto their domain.
//!
//! Some rows carry the author's address (`jdoe@reuters.com`) instead of an
//! outlet name. The domain is a better grouping key for those rows; every other
//! publisher string is kept as-is.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_DOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([\w.-]+)").expect("valid email domain pattern"));

/// Both derived publisher fields for one row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublisherIdentity {
    /// Lowercased domain when the publisher looks like an email address.
    pub domain: Option<String>,
    /// `domain` if present, else the raw publisher unchanged.
    pub clean: Option<String>,
}

/// Return the lowercased domain of an email-like publisher, if any.
pub fn extract_publisher_domain(publisher: &str) -> Option<String> {
    EMAIL_DOMAIN_RE
        .captures(publisher)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Resolve the publisher identity of a row. Never fails; an absent publisher
/// yields an empty identity.
pub fn resolve_publisher(publisher: Option<&str>) -> PublisherIdentity {
    let Some(raw) = publisher else {
        return PublisherIdentity::default();
    };
    let domain = extract_publisher_domain(raw);
    let clean = domain.clone().unwrap_or_else(|| raw.to_string());
    PublisherIdentity {
        domain,
        clean: Some(clean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_publisher_maps_to_domain() {
        let id = resolve_publisher(Some("jdoe@reuters.com"));
        assert_eq!(id.domain.as_deref(), Some("reuters.com"));
        assert_eq!(id.clean.as_deref(), Some("reuters.com"));
    }

    #[test]
    fn test_plain_publisher_unchanged() {
        let id = resolve_publisher(Some("Reuters Staff"));
        assert_eq!(id.domain, None);
        assert_eq!(id.clean.as_deref(), Some("Reuters Staff"));
    }

    #[test]
    fn test_domain_is_lowercased() {
        assert_eq!(
            extract_publisher_domain("Newsdesk <Desk@Benzinga.COM>").as_deref(),
            Some("benzinga.com")
        );
    }

    #[test]
    fn test_domain_with_hyphen_and_subdomain() {
        assert_eq!(
            extract_publisher_domain("a.b@news.market-watch.co.uk").as_deref(),
            Some("news.market-watch.co.uk")
        );
    }

    #[test]
    fn test_bare_at_sign_is_not_a_domain() {
        let id = resolve_publisher(Some("Lisa Levin @ "));
        assert_eq!(id.domain, None);
        assert_eq!(id.clean.as_deref(), Some("Lisa Levin @ "));
    }

    #[test]
    fn test_absent_publisher() {
        assert_eq!(resolve_publisher(None), PublisherIdentity::default());
    }
}
