use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Article,
    Audio,
}

impl ResourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "article" => Some(ResourceKind::Article),
            "audio" => Some(ResourceKind::Audio),
            _ => None,
        }
    }
}

/// A self-help resource. Premium entries are only shown to premium users.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: u32,
    #[schema(value_type = String)]
    pub title: &'static str,
    #[schema(value_type = String)]
    pub description: &'static str,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub is_premium: bool,
    #[schema(value_type = String)]
    pub url: &'static str,
}

impl Resource {
    pub fn visible_to(&self, is_premium: bool) -> bool {
        !self.is_premium || is_premium
    }
}

pub static CATALOG: &[Resource] = &[
    Resource {
        id: 1,
        title: "Understanding Anxiety",
        description: "Learn about anxiety symptoms and coping strategies",
        kind: ResourceKind::Article,
        is_premium: false,
        url: "/resources/anxiety-guide",
    },
    Resource {
        id: 2,
        title: "Guided Meditation Session",
        description: "15-minute guided meditation for stress relief",
        kind: ResourceKind::Audio,
        is_premium: true,
        url: "/resources/meditation-1",
    },
    Resource {
        id: 3,
        title: "Depression Support Guide",
        description: "Comprehensive guide for managing depression",
        kind: ResourceKind::Article,
        is_premium: false,
        url: "/resources/depression-guide",
    },
];

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("resource {0} not found")]
    NotFound(u32),
    #[error("premium subscription required")]
    PremiumRequired,
}

/// Catalog entries the caller may see, in catalog order.
pub fn visible(is_premium: bool) -> Vec<&'static Resource> {
    CATALOG.iter().filter(|r| r.visible_to(is_premium)).collect()
}

pub fn visible_of_kind(kind: ResourceKind, is_premium: bool) -> Vec<&'static Resource> {
    CATALOG
        .iter()
        .filter(|r| r.kind == kind && r.visible_to(is_premium))
        .collect()
}

pub fn access(id: u32, is_premium: bool) -> Result<&'static Resource, AccessError> {
    let resource = CATALOG
        .iter()
        .find(|r| r.id == id)
        .ok_or(AccessError::NotFound(id))?;
    if !resource.visible_to(is_premium) {
        return Err(AccessError::PremiumRequired);
    }
    Ok(resource)
}
