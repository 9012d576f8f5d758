use super::DeviceDetector;

/// Device class decided up front (tests, native shells).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDevice {
    pub mobile: bool,
}

impl FixedDevice {
    pub fn mobile() -> Self {
        Self { mobile: true }
    }

    pub fn desktop() -> Self {
        Self { mobile: false }
    }
}

impl DeviceDetector for FixedDevice {
    fn detect_mobile(&self) -> bool {
        self.mobile
    }
}

const MOBILE_MARKERS: [&str; 7] = [
    "android",
    "iphone",
    "ipod",
    "blackberry",
    "windows phone",
    "opera mini",
    "mobile",
];

/// Classifies a browser user-agent string.
///
/// Tablets that report a desktop user agent count as non-mobile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentDevice {
    user_agent: String,
}

impl UserAgentDevice {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl DeviceDetector for UserAgentDevice {
    fn detect_mobile(&self) -> bool {
        let ua = self.user_agent.to_ascii_lowercase();
        MOBILE_MARKERS.iter().any(|m| ua.contains(m))
    }
}
