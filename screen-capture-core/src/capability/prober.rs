//! Runtime capability probe.
//!
//! A pure function of the injected [`RuntimeEnvironment`]: nothing is
//! acquired and nothing leaves the process.

use serde::Serialize;

use crate::traits::environment::RuntimeEnvironment;

const FULL_SUPPORT: &str = "Your browser fully supports screen recording!";
const PARTIAL_SUPPORT: &str = "Some recording features may not be available.";
const SAFARI_LIMITED: &str = "Safari has limited screen recording support. For best experience, use Chrome.";
const SAFARI_UNSUPPORTED: &str = "Safari doesn't support screen recording. Please use Chrome for full functionality.";
const OTHER_FAMILY: &str = "For the best experience, please use Chrome or Edge browsers.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Safari,
    Firefox,
    Unknown,
}

impl BrowserFamily {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let has = |needle: &str| user_agent.contains(needle);
        if has("Chrome") && !has("Edg") {
            Self::Chrome
        } else if has("Edg") {
            Self::Edge
        } else if has("Safari") && !has("Chrome") {
            Self::Safari
        } else if has("Firefox") {
            Self::Firefox
        } else {
            Self::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Edge => "Edge",
            Self::Safari => "Safari",
            Self::Firefox => "Firefox",
            Self::Unknown => "Unknown",
        }
    }

    /// Chromium-based families with complete capture support.
    pub fn is_chromium(&self) -> bool {
        matches!(self, Self::Chrome | Self::Edge)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    pub browser: BrowserFamily,
    pub can_capture_display: bool,
    pub can_capture_microphone: bool,
    pub can_record_media: bool,
    pub can_record: bool,
    pub should_use_chrome: bool,
    pub advisory_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningLevel {
    Error,
    Warning,
}

/// Banner shown ahead of the controls when the runtime is not ideal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserWarning {
    pub level: WarningLevel,
    pub title: String,
    pub message: String,
    pub show_chrome_link: bool,
}

impl CapabilityReport {
    pub fn browser_warning(&self) -> Option<BrowserWarning> {
        let (level, title) = if !self.can_record {
            (WarningLevel::Error, "Browser Not Supported")
        } else if self.should_use_chrome {
            (WarningLevel::Warning, "Limited Support")
        } else {
            return None;
        };
        Some(BrowserWarning {
            level,
            title: title.to_string(),
            message: self.advisory_message.clone(),
            show_chrome_link: true,
        })
    }
}

pub fn probe(environment: &dyn RuntimeEnvironment) -> CapabilityReport {
    let browser = BrowserFamily::from_user_agent(&environment.user_agent());
    let can_capture_display = environment.supports_display_capture();
    let can_record_media = environment.supports_media_encoder();
    let can_record = can_capture_display && can_record_media;

    let advisory_message = match browser {
        BrowserFamily::Chrome | BrowserFamily::Edge if can_record => FULL_SUPPORT,
        BrowserFamily::Chrome | BrowserFamily::Edge => PARTIAL_SUPPORT,
        BrowserFamily::Safari if can_capture_display => SAFARI_LIMITED,
        BrowserFamily::Safari => SAFARI_UNSUPPORTED,
        BrowserFamily::Firefox | BrowserFamily::Unknown => OTHER_FAMILY,
    };

    let report = CapabilityReport {
        browser,
        can_capture_display,
        can_capture_microphone: environment.supports_user_media(),
        can_record_media,
        can_record,
        should_use_chrome: !browser.is_chromium(),
        advisory_message: advisory_message.to_string(),
    };
    log::debug!(
        "capability probe: browser={} display={} encoder={} mic={}",
        browser.name(),
        report.can_capture_display,
        report.can_record_media,
        report.can_capture_microphone
    );
    report
}
