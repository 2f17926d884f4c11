use serde::{Deserialize, Serialize};

use crate::blog::domain::{Group, GroupId, Post, PostText};
use crate::forms::{FormErrors, REQUIRED};

pub const INVALID_GROUP: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Raw post form as submitted. `group` is a group id or empty for none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub text: PostText,
    pub group: Option<GroupId>,
}

impl PostForm {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post
                .group
                .as_ref()
                .map(|g| g.id.get().to_string())
                .unwrap_or_default(),
        }
    }

    /// Check the submission against the groups that currently exist.
    pub fn validate(&self, groups: &[Group]) -> Result<ValidPost, FormErrors> {
        let mut errors = FormErrors::new();

        let text = PostText::parse(&self.text);
        if text.is_err() {
            errors.add("text", REQUIRED);
        }

        let group = match self.group.trim() {
            "" => None,
            raw => {
                let known = raw
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| groups.iter().find(|g| g.id.get() == id));
                match known {
                    Some(g) => Some(g.id),
                    None => {
                        errors.add("group", INVALID_GROUP);
                        None
                    }
                }
            }
        };

        match text {
            Ok(text) if errors.is_empty() => Ok(ValidPost { text, group }),
            _ => Err(errors),
        }
    }

    pub fn selects(&self, group: GroupId) -> bool {
        self.group.trim() == group.get().to_string()
    }
}
