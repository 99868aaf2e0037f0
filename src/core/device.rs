use strum_macros::Display;

/// Device family inferred from the User-Agent header for audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeviceClass {
    Mobile,
    Windows,
    Desktop,
    Unknown,
}

const MOBILE_TOKENS: [&str; 4] = ["android", "iphone", "ipad", "mobile"];

/// Substring classification in fixed priority order: mobile tokens win over
/// platform tokens (an Android UA also contains "linux").
pub fn classify_user_agent(user_agent: &str) -> DeviceClass {
    let ua = user_agent.to_ascii_lowercase();

    if MOBILE_TOKENS.iter().any(|t| ua.contains(t)) {
        return DeviceClass::Mobile;
    }
    if ua.contains("windows") {
        return DeviceClass::Windows;
    }
    if ua.contains("macintosh") || ua.contains("linux") {
        return DeviceClass::Desktop;
    }

    DeviceClass::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn android_beats_linux_token() {
        let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
        assert_eq!(classify_user_agent(ua), DeviceClass::Mobile);
    }

    #[test]
    fn iphone_is_mobile() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert_eq!(classify_user_agent(ua), DeviceClass::Mobile);
    }

    #[test]
    fn windows_desktop() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
        assert_eq!(classify_user_agent(ua), DeviceClass::Windows);
    }

    #[test]
    fn mac_and_linux_are_desktop() {
        assert_eq!(
            classify_user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)"),
            DeviceClass::Desktop
        );
        assert_eq!(
            classify_user_agent("Mozilla/5.0 (X11; Linux x86_64)"),
            DeviceClass::Desktop
        );
    }

    #[test]
    fn unrecognized_is_unknown() {
        assert_eq!(classify_user_agent("curl/8.4.0"), DeviceClass::Unknown);
        assert_eq!(classify_user_agent(""), DeviceClass::Unknown);
    }

    #[test]
    fn labels_are_uppercase() {
        assert_eq!(DeviceClass::Mobile.to_string(), "MOBILE");
        assert_eq!(DeviceClass::Unknown.to_string(), "UNKNOWN");
    }
}
