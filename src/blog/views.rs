//! Plain records handed to the renderer.

use serde::Serialize;

use crate::blog::domain::{Author, Group, Post, PostId};
use crate::blog::feed::Page;
use crate::blog::forms::PostForm;
use crate::forms::FormErrors;

const DATE_FORMAT: &str = "%d %b %Y %H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupLink {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub pub_date: String,
    pub group: Option<GroupLink>,
}

impl From<Post> for PostCard {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.get(),
            pub_date: post.pub_date.format(DATE_FORMAT).to_string(),
            author: post.author.username,
            group: post.group.map(|g| GroupLink {
                title: g.title,
                slug: g.slug.as_str().to_string(),
            }),
            text: post.text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedView {
    pub page: Page<PostCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeedView {
    pub group: Group,
    pub page: Page<PostCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeedView {
    pub author: Author,
    pub page: Page<PostCard>,
}

impl ProfileFeedView {
    pub fn post_count(&self) -> usize {
        self.page.total_items()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetailView {
    pub post: PostCard,
    pub author_post_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOption {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

/// A post form ready to (re)display, with any validation errors.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormView {
    pub form: PostForm,
    pub errors: FormErrors,
    pub groups: Vec<GroupOption>,
    pub editing: Option<PostId>,
}

impl PostFormView {
    pub fn new(
        form: PostForm,
        errors: FormErrors,
        groups: &[Group],
        editing: Option<PostId>,
    ) -> Self {
        let groups = groups
            .iter()
            .map(|g| GroupOption {
                id: g.id.get(),
                title: g.title.clone(),
                selected: form.selects(g.id),
            })
            .collect();
        Self {
            form,
            errors,
            groups,
            editing,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }
}
