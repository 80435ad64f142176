use serde::{Deserialize, Serialize};

/// Presentation data for one pair member, supplied by the external
/// profile/photo directory. The engine never derives or caches this;
/// it is fetched at read time to enrich the chooser inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCard {
    /// Owner's display name
    pub display_name: String,

    /// The dog's name (this is a dog-owner product, the dog leads)
    pub dog_name: String,

    /// Opaque reference to a representative photo, if one is selected
    pub photo_ref: Option<String>,
}
