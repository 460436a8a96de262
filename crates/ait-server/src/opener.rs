use ait::coordinator::{OriginId, SettingsOpener};

/// Opens the settings surface in the user's default browser.
pub struct BrowserSettingsOpener {
    url: String,
}

impl BrowserSettingsOpener {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SettingsOpener for BrowserSettingsOpener {
    fn open_settings(&self, origin: &OriginId) {
        tracing::info!(%origin, url = %self.url, "opening settings");
        if let Err(e) = webbrowser::open(&self.url) {
            tracing::warn!(error = %e, "failed to open a browser for settings");
        }
    }
}
