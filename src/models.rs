//! Resource types served by the JSON API.
//!
//! Field names follow the API's camelCase JSON.

use crate::entity::{EntityId, Resource};
use crate::repository::Materialize;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub lat: String,
    pub lng: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
    pub geo: Geo,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub catch_phrase: String,
    pub bs: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub address: Address,
    pub phone: String,
    pub website: String,
    pub company: Company,
}

/// Fields of a user to be created; the server assigns the id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub username: String,
    pub email: String,
    pub address: Address,
    pub phone: String,
    pub website: String,
    pub company: Company,
}

/// Partial user update. Unset fields are left out of the request body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

impl Resource for User {
    type Draft = UserDraft;
    type Patch = UserPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn resource_name() -> &'static str {
        "user"
    }
}

impl Materialize for User {
    fn from_draft(id: EntityId, draft: UserDraft) -> Self {
        User {
            id,
            name: draft.name,
            username: draft.username,
            email: draft.email,
            address: draft.address,
            phone: draft.phone,
            website: draft.website,
            company: draft.company,
        }
    }

    fn apply_patch(&self, patch: UserPatch) -> Self {
        let current = self.clone();
        User {
            id: current.id,
            name: patch.name.unwrap_or(current.name),
            username: patch.username.unwrap_or(current.username),
            email: patch.email.unwrap_or(current.email),
            address: patch.address.unwrap_or(current.address),
            phone: patch.phone.unwrap_or(current.phone),
            website: patch.website.unwrap_or(current.website),
            company: patch.company.unwrap_or(current.company),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: EntityId,
    pub id: EntityId,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub user_id: EntityId,
    pub title: String,
    pub body: String,
}

impl Resource for Post {
    type Draft = PostDraft;
    type Patch = PostDraft;

    fn id(&self) -> EntityId {
        self.id
    }

    fn resource_name() -> &'static str {
        "post"
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: EntityId,
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub post_id: EntityId,
    pub name: String,
    pub email: String,
    pub body: String,
}

impl Resource for Comment {
    type Draft = CommentDraft;
    type Patch = CommentDraft;

    fn id(&self) -> EntityId {
        self.id
    }

    fn resource_name() -> &'static str {
        "comment"
    }
}
