use chrono::Utc;
use thiserror::Error;

use crate::blog::domain::{Caller, Group, NewGroup, NewPost, PostChanges, PostId};
use crate::blog::feed::{Page, PageRequest, PageWindow};
use crate::blog::forms::PostForm;
use crate::blog::repository::{DynBlogRepository, PostFilter, RepositoryError};
use crate::blog::views::{
    FeedView, GroupFeedView, PostCard, PostDetailView, PostFormView, ProfileFeedView,
};
use crate::forms::FormErrors;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type BlogResult<T> = Result<T, BlogError>;

#[derive(Debug)]
pub enum CreateOutcome {
    /// Stored; the caller should land on their profile.
    Created { id: PostId, author: String },
    Invalid(PostFormView),
}

#[derive(Debug)]
pub enum EditOutcome {
    Updated(PostId),
    /// The caller is not the author; nothing changed.
    NotAuthor(PostId),
    Invalid(PostFormView),
}

#[derive(Debug)]
pub enum EditForm {
    Form(PostFormView),
    NotAuthor(PostId),
}

/// Feed and post operations over a repository.
#[derive(Clone)]
pub struct BlogService {
    repo: DynBlogRepository,
    page_size: usize,
}

impl BlogService {
    pub fn new(repo: DynBlogRepository, page_size: usize) -> Self {
        Self {
            repo,
            page_size: page_size.max(1),
        }
    }

    async fn feed(&self, filter: &PostFilter, request: PageRequest) -> BlogResult<Page<PostCard>> {
        let total = self.repo.count_posts(filter).await?;
        let window = PageWindow::resolve(total, self.page_size, request);
        let posts = self
            .repo
            .list_posts(filter, window.offset(), window.limit())
            .await?;
        Ok(Page::new(posts, window).map(PostCard::from))
    }

    pub async fn home_feed(&self, request: PageRequest) -> BlogResult<FeedView> {
        let page = self.feed(&PostFilter::All, request).await?;
        Ok(FeedView { page })
    }

    pub async fn group_feed(&self, slug: &str, request: PageRequest) -> BlogResult<GroupFeedView> {
        let group = self
            .repo
            .find_group_by_slug(slug)
            .await?
            .ok_or(BlogError::NotFound("group"))?;
        let page = self.feed(&PostFilter::Group(group.id), request).await?;
        Ok(GroupFeedView { group, page })
    }

    pub async fn profile_feed(
        &self,
        username: &str,
        request: PageRequest,
    ) -> BlogResult<ProfileFeedView> {
        let author = self
            .repo
            .find_author(username)
            .await?
            .ok_or(BlogError::NotFound("author"))?;
        let page = self
            .feed(&PostFilter::Author(author.id.clone()), request)
            .await?;
        Ok(ProfileFeedView { author, page })
    }

    pub async fn post_detail(&self, id: PostId) -> BlogResult<PostDetailView> {
        let post = self
            .repo
            .find_post(id)
            .await?
            .ok_or(BlogError::NotFound("post"))?;
        let author_post_count = self
            .repo
            .count_posts(&PostFilter::Author(post.author.id.clone()))
            .await?;
        Ok(PostDetailView {
            post: PostCard::from(post),
            author_post_count,
        })
    }

    pub async fn new_post_form(&self) -> BlogResult<PostFormView> {
        let groups = self.repo.list_groups().await?;
        Ok(PostFormView::new(
            PostForm::default(),
            FormErrors::new(),
            &groups,
            None,
        ))
    }

    pub async fn create_post(&self, caller: &Caller, form: PostForm) -> BlogResult<CreateOutcome> {
        let groups = self.repo.list_groups().await?;
        let valid = match form.validate(&groups) {
            Ok(valid) => valid,
            Err(errors) => {
                return Ok(CreateOutcome::Invalid(PostFormView::new(
                    form, errors, &groups, None,
                )));
            }
        };

        let post = self
            .repo
            .insert_post(&NewPost {
                text: valid.text,
                author: caller.id.clone(),
                group: valid.group,
                pub_date: Utc::now(),
            })
            .await?;
        tracing::info!(post_id = %post.id, author = %caller.username, "Post created");

        Ok(CreateOutcome::Created {
            id: post.id,
            author: caller.username.clone(),
        })
    }

    pub async fn edit_post_form(&self, caller: &Caller, id: PostId) -> BlogResult<EditForm> {
        let post = self
            .repo
            .find_post(id)
            .await?
            .ok_or(BlogError::NotFound("post"))?;
        if !post.is_authored_by(caller) {
            tracing::debug!(post_id = %id, caller = %caller.username, "Edit form refused: not the author");
            return Ok(EditForm::NotAuthor(id));
        }

        let groups = self.repo.list_groups().await?;
        Ok(EditForm::Form(PostFormView::new(
            PostForm::from_post(&post),
            FormErrors::new(),
            &groups,
            Some(id),
        )))
    }

    pub async fn edit_post(
        &self,
        caller: &Caller,
        id: PostId,
        form: PostForm,
    ) -> BlogResult<EditOutcome> {
        let post = self
            .repo
            .find_post(id)
            .await?
            .ok_or(BlogError::NotFound("post"))?;
        if !post.is_authored_by(caller) {
            tracing::debug!(post_id = %id, caller = %caller.username, "Edit ignored: not the author");
            return Ok(EditOutcome::NotAuthor(id));
        }

        let groups = self.repo.list_groups().await?;
        let valid = match form.validate(&groups) {
            Ok(valid) => valid,
            Err(errors) => {
                return Ok(EditOutcome::Invalid(PostFormView::new(
                    form,
                    errors,
                    &groups,
                    Some(id),
                )));
            }
        };

        self.repo
            .update_post(
                id,
                &PostChanges {
                    text: valid.text,
                    group: valid.group,
                },
            )
            .await?
            .ok_or(BlogError::NotFound("post"))?;
        tracing::info!(post_id = %id, author = %caller.username, "Post updated");

        Ok(EditOutcome::Updated(id))
    }

    /// Admin-side: groups are created outside the web surface.
    pub async fn add_group(&self, group: &NewGroup) -> BlogResult<Group> {
        let created = self.repo.insert_group(group).await?;
        tracing::info!(slug = %created.slug, "Group added");
        Ok(created)
    }
}
