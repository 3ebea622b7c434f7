//! Avatar Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{Presenter, VideoProviderPort};
use crate::application::queries::ListAvatars;

/// 头像信息
#[derive(Debug, Clone)]
pub struct AvatarView {
    pub id: String,
    pub name: String,
    pub thumbnail: Option<String>,
}

impl From<Presenter> for AvatarView {
    fn from(presenter: Presenter) -> Self {
        Self {
            // 没有名称时使用 presenter id
            name: presenter
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| presenter.presenter_id.clone()),
            id: presenter.presenter_id,
            thumbnail: presenter.thumbnail_url,
        }
    }
}

/// ListAvatars Handler
pub struct ListAvatarsHandler {
    provider: Arc<dyn VideoProviderPort>,
}

impl ListAvatarsHandler {
    pub fn new(provider: Arc<dyn VideoProviderPort>) -> Self {
        Self { provider }
    }

    pub async fn handle(&self, _query: ListAvatars) -> Result<Vec<AvatarView>, ApplicationError> {
        let presenters = self.provider.list_presenters().await?;
        Ok(presenters.into_iter().map(AvatarView::from).collect())
    }
}
