use crate::{Error, Result};
use std::collections::BTreeMap;

pub const KUBERNETES_ENTRYPOINT: &str = "KUBERNETES_ENTRYPOINT";
pub const IRONIC_PXE: &str = "IRONIC_PXE";
pub const IRONIC_CONDUCTOR: &str = "IRONIC_CONDUCTOR";
pub const NGINX: &str = "NGINX";

/// Container image references keyed by logical component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Images(BTreeMap<String, String>);

impl Images {
    pub fn new(images: BTreeMap<String, String>) -> Self {
        Self(images)
    }

    /// Looks up the image for `key`. Absent and empty entries are both errors.
    pub fn get(&self, key: &str) -> Result<String> {
        match self.0.get(key) {
            Some(image) if !image.is_empty() => Ok(image.clone()),
            Some(_) => Err(Error::ConfigurationError(format!(
                "image mapping has an empty value for {}",
                key
            ))),
            None => Err(Error::ConfigurationError(format!(
                "image mapping missing key {}",
                key
            ))),
        }
    }
}

impl From<BTreeMap<String, String>> for Images {
    fn from(v: BTreeMap<String, String>) -> Self {
        Images::new(v)
    }
}
