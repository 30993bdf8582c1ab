//! Host classification against the application's central domains.

/// Where a request host sits relative to the central domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostClass {
    /// One of the application's own root domains.
    Central,
    /// `localhost` style single-label hosts and IP literals.
    Local,
    /// A domain outside every central domain (possibly a tenant's custom domain).
    ThirdParty,
    /// A subdomain of a central domain; carries the full normalized host.
    TenantCandidate(String),
}

/// The configured set of non-tenant root domains, normalized on construction.
#[derive(Debug, Clone, Default)]
pub struct CentralDomains(Vec<String>);

impl CentralDomains {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = domains
            .into_iter()
            .map(|d| normalize_host(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        Self(normalized)
    }

    pub fn contains(&self, host: &str) -> bool {
        self.0.iter().any(|d| d == host)
    }

    /// True when `host` is a strict subdomain of some central domain.
    pub fn is_subdomain(&self, host: &str) -> bool {
        self.0.iter().any(|central| {
            host.len() > central.len() + 1
                && host.ends_with(central.as_str())
                && host.as_bytes()[host.len() - central.len() - 1] == b'.'
        })
    }
}

/// Lowercase, strip the port and any trailing dot.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();

    let without_port = if host.starts_with('[') {
        // Bracketed IPv6 literal, keep the brackets and drop a trailing port
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => host,
        }
    };

    without_port.trim_end_matches('.').to_ascii_lowercase()
}

pub fn classify(host: &str, central_domains: &CentralDomains) -> HostClass {
    let host = normalize_host(host);

    if central_domains.contains(&host) {
        return HostClass::Central;
    }

    if host.starts_with('[') || host.contains(':') {
        return HostClass::Local;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() == 1 {
        return HostClass::Local;
    }
    if labels
        .iter()
        .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_digit()))
    {
        return HostClass::Local;
    }

    if central_domains.is_subdomain(&host) {
        HostClass::TenantCandidate(host)
    } else {
        HostClass::ThirdParty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn central() -> CentralDomains {
        CentralDomains::new(["example.com", "App.Example.org"])
    }

    #[test]
    fn test_central_domain() {
        assert_eq!(classify("example.com", &central()), HostClass::Central);
        assert_eq!(classify("app.example.org", &central()), HostClass::Central);
        assert_eq!(classify("EXAMPLE.com:8080", &central()), HostClass::Central);
    }

    #[test]
    fn test_local_hosts() {
        assert_eq!(classify("localhost", &central()), HostClass::Local);
        assert_eq!(classify("localhost:3000", &central()), HostClass::Local);
        assert_eq!(classify("127.0.0.1", &central()), HostClass::Local);
        assert_eq!(classify("10.1.2.3:443", &central()), HostClass::Local);
        assert_eq!(classify("[::1]:8080", &central()), HostClass::Local);
    }

    #[test]
    fn test_tenant_subdomain() {
        assert_eq!(
            classify("tenant1.example.com", &central()),
            HostClass::TenantCandidate("tenant1.example.com".to_string())
        );
        assert_eq!(
            classify("Acme.App.Example.org.", &central()),
            HostClass::TenantCandidate("acme.app.example.org".to_string())
        );
    }

    #[test]
    fn test_suffix_must_fall_on_label_boundary() {
        assert_eq!(classify("evilexample.com", &central()), HostClass::ThirdParty);
    }

    #[test]
    fn test_third_party_domain() {
        assert_eq!(classify("tenant-custom.io", &central()), HostClass::ThirdParty);
        assert_eq!(classify("example.com.evil.net", &central()), HostClass::ThirdParty);
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host(" Foo.Example.COM:443 "), "foo.example.com");
        assert_eq!(normalize_host("foo.example.com."), "foo.example.com");
        assert_eq!(normalize_host("[::1]:80"), "[::1]");
    }

    #[test]
    fn test_central_domains_deduplicate() {
        let domains = CentralDomains::new(["example.com", "EXAMPLE.COM", ""]);
        assert!(domains.contains("example.com"));
        assert!(!domains.contains(""));
        assert_eq!(classify("EXAMPLE.com", &domains), HostClass::Central);
    }
}
