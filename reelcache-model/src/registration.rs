/// A streaming URL issued by the local streaming server for a file path.
///
/// Registrations live for the lifetime of the streaming server session and
/// are never written to the persistent cache.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VideoRegistration {
    pub id: String,
    pub url: String,
}
