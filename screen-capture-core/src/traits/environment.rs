/// Capability queries against the runtime the recorder runs in.
///
/// Pure lookups: no side effects, no network.
pub trait RuntimeEnvironment: Send + Sync {
    /// Identification string of the hosting runtime (a browser user agent).
    fn user_agent(&self) -> String;

    fn supports_display_capture(&self) -> bool;

    fn supports_user_media(&self) -> bool;

    fn supports_media_encoder(&self) -> bool;

    fn supports_device_enumeration(&self) -> bool;
}
