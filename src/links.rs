//! Opening links from note content in the system browser.

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid URL {url:?}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("refusing to open {scheme}: URL")]
    Scheme { scheme: String },

    #[error("failed to launch browser: {0}")]
    Launch(#[from] std::io::Error),
}

/// Something that can show a URL to the user.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &Url) -> Result<(), LinkError>;
}

/// Opens URLs with the operating system's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl LinkOpener for SystemBrowser {
    fn open(&self, url: &Url) -> Result<(), LinkError> {
        open::that_detached(url.as_str())?;
        Ok(())
    }
}

/// Parses `raw` and accepts it only if the scheme is `http` or `https`.
pub fn validate_external_link(raw: &str) -> Result<Url, LinkError> {
    let url = Url::parse(raw.trim()).map_err(|source| LinkError::Parse {
        url: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(LinkError::Scheme {
            scheme: scheme.to_string(),
        }),
    }
}

/// Validates `raw` and hands it to `opener`.
///
/// Rejected or failed links are logged and otherwise ignored. Returns
/// whether the link was handed off.
pub fn open_external_link(opener: &dyn LinkOpener, raw: &str) -> bool {
    let url = match validate_external_link(raw) {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "ignoring external link");
            return false;
        }
    };

    match opener.open(&url) {
        Ok(()) => {
            info!(url = %url, "opened external link");
            true
        }
        Err(e) => {
            warn!(url = %url, error = %e, "failed to open external link");
            false
        }
    }
}
