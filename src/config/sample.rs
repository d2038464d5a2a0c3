use crate::ConfigError;
use std::path::Path;

/// Annotated example configuration written by `--generate-config`
pub const SAMPLE_CONFIG: &str = r#"# Markdown Spider configuration

# Seed URL the crawl starts from
url = "https://www.pulumi.com/registry/packages/gcp/api-docs/"
output-dir = "./pulumi_gcp_docs"
max-depth = 3
num-threads = 12
# Seconds each worker waits between two requests
throttle = 0.5
same-domain-only = false
# allowed-domains = ["*.pulumi.com"]
format = "md"
# max-children-per-page = 50
# max-pages = 1000
timeout = 10
force-overwrite = false
# summary-path = "./crawl-summary.md"

[headers]
User-Agent = "Documentation Spider Bot"

[[path-configs]]
path-prefix = "https://www.pulumi.com/registry/packages/gcp/api-docs/"
target-content = ["div.docs-main-content"]
ignore-selectors = [
    "nav",
    "footer",
    ".header-nav",
    ".docs-breadcrumb",
    ".docs-table-of-contents",
    "title",
]
exclude-patterns = ["/typescript/", "/go/", "/csharp/", "/changelog/"]
description = "Pulumi GCP API docs"

[[path-configs]]
path-prefix = "https://cloud.google.com/"
target-content = [".devsite-article-body", "main", "article"]
ignore-selectors = ["nav", "header", "footer", ".devsite-book-nav"]
description = "Google Cloud documentation"
"#;

/// Writes [`SAMPLE_CONFIG`] to `path`, refusing to replace an existing file
pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::Validation(format!(
            "Refusing to overwrite existing file {}",
            path.display()
        )));
    }
    std::fs::write(path, SAMPLE_CONFIG)?;
    Ok(())
}
