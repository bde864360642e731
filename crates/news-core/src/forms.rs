//! Request input binding and field validation.
//!
//! Forms are parsed from url-encoded key/value pairs so repeated keys
//! (multi-select fields) survive. Every form has a raw "draft" that can be
//! re-rendered with its errors, and a validated counterpart.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::{Post, PostType};

pub const REQUIRED: &str = "This field is required.";

/// Key under which errors not tied to a single field are reported.
pub const NON_FIELD: &str = "__all__";

const TITLE_MAX: usize = 128;
const CATEGORY_NAME_MAX: usize = 64;
const USERNAME_MAX: usize = 150;
const PASSWORD_MIN: usize = 8;

/// Field name to error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field, empty when the field is valid.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// First value submitted for `name`.
pub fn field<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Every value submitted for `name`, in submission order.
pub fn fields<'a>(pairs: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .collect()
}

fn text(pairs: &[(String, String)], name: &str) -> String {
    field(pairs, name).unwrap_or_default().trim().to_string()
}

fn checkbox(pairs: &[(String, String)], name: &str) -> bool {
    matches!(field(pairs, name), Some(v) if !v.is_empty() && v != "false" && v != "off")
}

/// Raw post form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub post_type: String,
    pub categories: Vec<String>,
    pub title: String,
    pub text: String,
}

/// Validated post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    pub post_type: PostType,
    pub category_ids: Vec<i32>,
    pub title: String,
    pub text: String,
}

impl PostDraft {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            post_type: text(pairs, "type"),
            categories: fields(pairs, "category")
                .into_iter()
                .map(|v| v.trim().to_string())
                .collect(),
            title: text(pairs, "title"),
            text: text(pairs, "text"),
        }
    }

    /// Pre-filled draft for editing an existing post.
    pub fn from_post(post: &Post, category_ids: &[i32]) -> Self {
        Self {
            post_type: post.post_type.as_str().to_string(),
            categories: category_ids.iter().map(i32::to_string).collect(),
            title: post.title.clone(),
            text: post.text.clone(),
        }
    }

    pub fn has_category(&self, id: i32) -> bool {
        self.categories.iter().any(|c| c.parse::<i32>().ok() == Some(id))
    }

    pub fn validate(&self) -> Result<PostForm, FormErrors> {
        let mut errors = FormErrors::new();

        let post_type = if self.post_type.is_empty() {
            errors.add("type", REQUIRED);
            None
        } else {
            match self.post_type.parse::<PostType>() {
                Ok(t) => Some(t),
                Err(_) => {
                    errors.add(
                        "type",
                        format!(
                            "Select a valid choice. {} is not one of the available choices.",
                            self.post_type
                        ),
                    );
                    None
                }
            }
        };

        let mut category_ids = Vec::new();
        for raw in &self.categories {
            match raw.parse::<i32>() {
                Ok(id) if !category_ids.contains(&id) => category_ids.push(id),
                Ok(_) => {}
                Err(_) => errors.add("category", format!("'{}' is not a valid value.", raw)),
            }
        }
        if self.categories.is_empty() {
            errors.add("category", REQUIRED);
        }

        if self.title.is_empty() {
            errors.add("title", REQUIRED);
        } else if self.title.chars().count() > TITLE_MAX {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    TITLE_MAX,
                    self.title.chars().count()
                ),
            );
        }

        if self.text.is_empty() {
            errors.add("text", REQUIRED);
        }

        errors.finish(|| PostForm {
            post_type: post_type.unwrap_or(PostType::Article),
            category_ids,
            title: self.title.clone(),
            text: self.text.clone(),
        })
    }
}

/// Comment form: a single text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn parse(pairs: &[(String, String)]) -> Result<Self, FormErrors> {
        let text = text(pairs, "text");
        let mut errors = FormErrors::new();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.finish(|| CommentForm { text })
    }
}

/// Category creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryForm {
    pub name: String,
}

impl CategoryForm {
    pub fn parse(pairs: &[(String, String)]) -> Result<Self, FormErrors> {
        let name = text(pairs, "name");
        let mut errors = FormErrors::new();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        } else if name.chars().count() > CATEGORY_NAME_MAX {
            errors.add(
                "name",
                format!(
                    "Ensure this value has at most {} characters.",
                    CATEGORY_NAME_MAX
                ),
            );
        }
        errors.finish(|| CategoryForm { name })
    }
}

/// Raw signup form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupDraft {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    pub become_author: bool,
}

/// Validated signup form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub become_author: bool,
}

impl SignupDraft {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            username: text(pairs, "username"),
            email: text(pairs, "email"),
            password1: field(pairs, "password1").unwrap_or_default().to_string(),
            password2: field(pairs, "password2").unwrap_or_default().to_string(),
            become_author: checkbox(pairs, "become_author"),
        }
    }

    pub fn validate(&self) -> Result<SignupForm, FormErrors> {
        let mut errors = FormErrors::new();

        if self.username.is_empty() {
            errors.add("username", REQUIRED);
        } else if self.username.chars().count() > USERNAME_MAX
            || !self
                .username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if self.email.is_empty() {
            errors.add("email", REQUIRED);
        } else if !is_plausible_email(&self.email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN
                ),
            );
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "You must type the same password each time.");
        }

        errors.finish(|| SignupForm {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password1.clone(),
            become_author: self.become_author,
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn parse(pairs: &[(String, String)]) -> Result<Self, FormErrors> {
        let form = LoginForm {
            username: text(pairs, "username"),
            password: field(pairs, "password").unwrap_or_default().to_string(),
        };
        let mut errors = FormErrors::new();
        if form.username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if form.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.finish(|| form)
    }
}
