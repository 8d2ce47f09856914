//! Rewriting private R2 storage URLs to a public domain.

use crate::constants::R2_PRIVATE_HOST_SUFFIX;
use url::Url;

/// Maps R2 storage URLs onto the configured public domain.
///
/// Without a public domain this is the identity function. URLs on any other host, and
/// strings that do not parse as URLs, pass through untouched.
#[derive(Clone, Debug, Default)]
pub struct UrlRewriter {
    public_base: Option<String>,
}

impl UrlRewriter {
    pub fn new(public_domain: Option<&str>) -> Self {
        let public_base = public_domain
            .map(|d| d.trim().trim_end_matches('/').to_string())
            .filter(|d| !d.is_empty());
        Self { public_base }
    }

    pub fn is_enabled(&self) -> bool {
        self.public_base.is_some()
    }

    /// Rewrite one URL. The path is preserved; query and fragment are not.
    pub fn rewrite(&self, raw: &str) -> String {
        let Some(base) = &self.public_base else {
            return raw.to_string();
        };

        match Url::parse(raw) {
            Ok(parsed)
                if parsed
                    .host_str()
                    .is_some_and(|host| host.ends_with(R2_PRIVATE_HOST_SUFFIX)) =>
            {
                format!("{}{}", base, parsed.path())
            }
            Ok(_) => raw.to_string(),
            Err(e) => {
                tracing::debug!(url = raw, error = %e, "unparseable image URL left as-is");
                raw.to_string()
            }
        }
    }

    pub fn rewrite_all(&self, urls: &[String]) -> Vec<String> {
        urls.iter().map(|u| self.rewrite(u)).collect()
    }
}
