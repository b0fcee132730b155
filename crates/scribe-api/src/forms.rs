//! Post form: validates the submitted `text`/`group` pair and saves it as a
//! new post or onto the post it was built for.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use serde::Serialize;

use scribe_db::models::{GroupRow, PostRow};
use scribe_db::{BlogStore, NewPost};
use scribe_types::api::PostFormData;

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Field name -> messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone)]
struct Instance {
    id: i64,
    text: String,
    group_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct PostForm {
    data: Option<PostFormData>,
    instance: Option<Instance>,
}

/// A validated post. Inserting requires an author; drafts bound to an
/// existing post update it in place instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    pub author_id: Option<i64>,
    instance_id: Option<i64>,
}

impl PostForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-populated from, and saving onto, an existing post.
    pub fn for_instance(post: &PostRow) -> Self {
        Self {
            data: None,
            instance: Some(Instance {
                id: post.id,
                text: post.text.clone(),
                group_id: post.group_id,
            }),
        }
    }

    pub fn bind(mut self, data: PostFormData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    /// Values to show in the form: submitted data if bound, else the instance's.
    pub fn values(&self) -> PostFormData {
        match (&self.data, &self.instance) {
            (Some(data), _) => data.clone(),
            (None, Some(instance)) => PostFormData {
                text: instance.text.clone(),
                group: instance.group_id.map(|id| id.to_string()),
            },
            (None, None) => PostFormData::default(),
        }
    }

    /// `groups` are the valid choices for the group field. An unbound form
    /// never validates and reports no errors.
    pub fn validate(&self, groups: &[GroupRow]) -> Result<PostDraft, FieldErrors> {
        let Some(data) = &self.data else {
            return Err(FieldErrors::new());
        };

        let mut errors = FieldErrors::new();

        let text = data.text.trim();
        if text.is_empty() {
            errors.entry("text".into()).or_default().push(REQUIRED.into());
        }

        let group_id = match data.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let choice = raw.parse::<i64>().ok().filter(|id| groups.iter().any(|g| g.id == *id));
                if choice.is_none() {
                    errors.entry("group".into()).or_default().push(INVALID_CHOICE.into());
                }
                choice
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(PostDraft {
            text: text.to_string(),
            group_id,
            author_id: None,
            instance_id: self.instance.as_ref().map(|i| i.id),
        })
    }

    pub fn context(&self, errors: &FieldErrors) -> FormContext {
        FormContext {
            fields: FormFields::default(),
            data: self.values(),
            errors: errors.clone(),
            is_bound: self.is_bound(),
        }
    }
}

impl PostDraft {
    pub fn with_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Returns the id of the saved post.
    pub fn save(&self, store: &dyn BlogStore) -> Result<i64> {
        match self.instance_id {
            Some(id) => {
                store.update_post(id, &self.text, self.group_id)?;
                Ok(id)
            }
            None => {
                let author_id = self.author_id.ok_or_else(|| anyhow!("post draft has no author"))?;
                store.insert_post(&NewPost {
                    text: self.text.clone(),
                    author_id,
                    group_id: self.group_id,
                })
            }
        }
    }
}

// -- Rendering --

#[derive(Debug, Serialize)]
pub struct FieldSpec {
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
    pub widget: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FormFields {
    pub text: FieldSpec,
    pub group: FieldSpec,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            text: FieldSpec {
                label: "Post text",
                help_text: "Enter the text of the post",
                required: true,
                widget: "textarea",
            },
            group: FieldSpec {
                label: "Group",
                help_text: "Group the post will belong to",
                required: false,
                widget: "select",
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FormContext {
    pub fields: FormFields,
    pub data: PostFormData,
    pub errors: FieldErrors,
    pub is_bound: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_db::{Database, PostFilter};

    fn groups() -> Vec<GroupRow> {
        vec![GroupRow {
            id: 1,
            title: "Test group".into(),
            slug: "test-slug".into(),
            description: String::new(),
        }]
    }

    fn submit(text: &str, group: Option<&str>) -> PostForm {
        PostForm::new().bind(PostFormData {
            text: text.into(),
            group: group.map(String::from),
        })
    }

    #[test]
    fn valid_submission_leaves_author_unset() {
        let draft = submit("  Hello  ", Some("1")).validate(&groups()).unwrap();
        assert_eq!(draft.text, "Hello");
        assert_eq!(draft.group_id, Some(1));
        assert_eq!(draft.author_id, None);
    }

    #[test]
    fn empty_group_means_no_group() {
        let draft = submit("Hello", Some("")).validate(&groups()).unwrap();
        assert_eq!(draft.group_id, None);
        let draft = submit("Hello", None).validate(&groups()).unwrap();
        assert_eq!(draft.group_id, None);
    }

    #[test]
    fn blank_text_is_required() {
        let errors = submit("   ", None).validate(&groups()).unwrap_err();
        assert_eq!(errors["text"], vec![REQUIRED.to_string()]);
        assert!(!errors.contains_key("group"));
    }

    #[test]
    fn unknown_group_is_rejected() {
        let errors = submit("Hello", Some("42")).validate(&groups()).unwrap_err();
        assert_eq!(errors["group"], vec![INVALID_CHOICE.to_string()]);
        let errors = submit("Hello", Some("not-a-number")).validate(&groups()).unwrap_err();
        assert!(errors.contains_key("group"));
    }

    #[test]
    fn unbound_form_is_invalid_without_errors() {
        let form = PostForm::new();
        assert!(!form.is_bound());
        assert!(form.validate(&groups()).unwrap_err().is_empty());
    }

    #[test]
    fn instance_form_shows_current_values() {
        let row = PostRow {
            id: 5,
            text: "current".into(),
            created_at: String::new(),
            author_id: 1,
            author_username: "auth".into(),
            group_id: Some(1),
            group_title: Some("Test group".into()),
            group_slug: Some("test-slug".into()),
        };
        let form = PostForm::for_instance(&row);
        assert_eq!(form.values().text, "current");
        assert_eq!(form.values().group.as_deref(), Some("1"));

        let bound = form.bind(PostFormData { text: "new".into(), group: None });
        assert_eq!(bound.values().text, "new");
    }

    #[test]
    fn save_inserts_then_updates() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_user("auth", "hash").unwrap();
        let group = db.create_group("Test group", "test-slug", "").unwrap();
        let choices = db.list_groups().unwrap();

        let draft = submit("first", Some(group.to_string().as_str())).validate(&choices).unwrap();
        assert!(draft.save(&db).is_err(), "insert without author must fail");

        let id = draft.with_author(author).save(&db).unwrap();
        let row = db.get_post(id).unwrap().unwrap();
        assert_eq!(row.group_id, Some(group));

        let edited = PostForm::for_instance(&row)
            .bind(PostFormData { text: "second".into(), group: None })
            .validate(&choices)
            .unwrap();
        assert_eq!(edited.save(&db).unwrap(), id);

        let row = db.get_post(id).unwrap().unwrap();
        assert_eq!(row.text, "second");
        assert_eq!(row.group_id, None);
        assert_eq!(row.author_id, author);
        assert_eq!(db.count_posts(PostFilter::All).unwrap(), 1);
    }
}
