use std::sync::Arc;

use crate::application::posts::PostService;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<PostService>,
}

impl ApiState {
    pub fn new(posts: PostService) -> Self {
        Self {
            posts: Arc::new(posts),
        }
    }
}
