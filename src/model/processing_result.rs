use crate::model::Resource;
use serde::Serialize;

/// Outcome of processing one resource, handed back to the coordinator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProcessingResult {
    /// The resource was processed; `new_resources` were discovered from it
    ///
    /// The activation call carries no processed resource and exactly one new
    /// resource, the start URL.
    Successful {
        processed_resource: Option<Resource>,
        new_resources: Vec<Resource>,
    },
    /// Processing failed; nothing was discovered
    Failed { processed_resource: Resource },
}

impl ProcessingResult {
    /// Result of processing a resource that discovered nothing
    pub fn processed(resource: Resource) -> Self {
        Self::Successful {
            processed_resource: Some(resource),
            new_resources: Vec::new(),
        }
    }

    pub fn processed_resource(&self) -> Option<&Resource> {
        match self {
            Self::Successful {
                processed_resource, ..
            } => processed_resource.as_ref(),
            Self::Failed { processed_resource } => Some(processed_resource),
        }
    }

    /// Consumes the result, yielding the candidates it discovered
    pub fn into_new_resources(self) -> Vec<Resource> {
        match self {
            Self::Successful { new_resources, .. } => new_resources,
            Self::Failed { .. } => Vec::new(),
        }
    }
}
