use crate::config::{Config, OutputFormat};
use crate::output::OutputPath;
use crate::rules::{PathConfig, RuleTable};
use crate::url::{normalize, DomainPolicy, NormalizeOptions};
use crate::ConfigError;
use url::Url;

/// Everything that decides whether a URL belongs to this crawl
///
/// Built once from the configuration and shared read-only by every worker.
/// The link collector uses it to filter candidates and the extractor uses
/// it to decide which hyperlinks become relative links into the output tree.
#[derive(Debug, Clone)]
pub struct CrawlScope {
    seed: Url,
    rules: RuleTable,
    domains: DomainPolicy,
    normalize: NormalizeOptions,
    restrict_to_path_configs: bool,
    format: OutputFormat,
}

impl CrawlScope {
    /// Builds the scope for a validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlScope)` - Seed normalized, rules compiled
    /// * `Err(ConfigError)` - Bad base URL, selector or pattern
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let options = config.normalize_options();
        let seed = normalize(&config.url, None, options)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base url '{}': {}", config.url, e)))?;
        let rules = RuleTable::from_entries(&config.path_configs)?;
        let domains = DomainPolicy::new(&seed, config.same_domain_only, &config.allowed_domains);

        Ok(Self {
            seed,
            rules,
            domains,
            normalize: options,
            restrict_to_path_configs: config.restrict_to_path_configs,
            format: config.format,
        })
    }

    /// Canonical seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Extraction rule for `url`
    pub fn rule_for(&self, url: &Url) -> &PathConfig {
        self.rules.match_url(url)
    }

    /// Resolves `href` against `base` and canonicalizes it
    ///
    /// Returns `None` for anything that is not a valid http(s) URL.
    pub fn resolve(&self, href: &str, base: &Url) -> Option<Url> {
        normalize(href, Some(base), self.normalize).ok()
    }

    /// Returns true if a link to the canonical `url` should be followed
    ///
    /// The URL must pass the domain policy and the exclude/include patterns
    /// of the rule that covers it. With `restrict_to_path_configs` it must
    /// also be covered by a configured prefix.
    pub fn admits(&self, url: &Url) -> bool {
        if !self.domains.allows(url) {
            tracing::debug!("Domain policy rejects {}", url);
            return false;
        }

        let rule = match self.rules.find(url) {
            Some(rule) => rule,
            None if self.restrict_to_path_configs && !self.rules.is_empty() => {
                tracing::debug!("No path config covers {}", url);
                return false;
            }
            None => self.rules.match_url(url),
        };

        if !rule.permits(url) {
            tracing::debug!("Patterns of '{}' reject {}", rule.description, url);
            return false;
        }

        true
    }

    /// Where the document for `url` is written, relative to the output root
    pub fn output_path(&self, url: &Url) -> OutputPath {
        OutputPath::for_url(url, self.domains.base_site(), self.format.extension())
    }
}
