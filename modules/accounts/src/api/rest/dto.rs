use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{
    AddForm, AdminNewUser, AdminUserPatch, Credentials, FormField, NewUser, ProfilePatch, User,
};

/// Sign-up body. Every field is optional at the wire level so the service
/// reports what is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateUserReq {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TokenReq {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenDto {
    pub token: String,
}

/// Public view of an account: exactly email and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileDto {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateProfileReq {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Admin view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUserDto {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUserListDto {
    pub users: Vec<AdminUserDto>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AdminCreateReq {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AdminPatchReq {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormFieldDto {
    pub name: String,
    pub kind: String,
    pub required: bool,
}

/// Shape of the admin "add user" view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddFormDto {
    pub fields: Vec<FormFieldDto>,
    pub min_password_length: usize,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for ProfileDto {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

impl From<User> for AdminUserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<FormField> for FormFieldDto {
    fn from(f: FormField) -> Self {
        Self {
            name: f.name.to_owned(),
            kind: f.kind.to_owned(),
            required: f.required,
        }
    }
}

impl From<AddForm> for AddFormDto {
    fn from(form: AddForm) -> Self {
        Self {
            fields: form.fields.into_iter().map(Into::into).collect(),
            min_password_length: form.min_password_length,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            email: req.email,
            password: req.password.unwrap_or_default(),
            name: req.name,
        }
    }
}

impl From<TokenReq> for Credentials {
    fn from(req: TokenReq) -> Self {
        Self {
            email: req.email.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
        }
    }
}

impl From<UpdateProfileReq> for ProfilePatch {
    fn from(req: UpdateProfileReq) -> Self {
        Self {
            email: req.email,
            name: req.name,
            password: req.password,
        }
    }
}

impl From<AdminCreateReq> for AdminNewUser {
    fn from(req: AdminCreateReq) -> Self {
        Self {
            email: req.email,
            password: req.password.unwrap_or_default(),
            name: req.name,
            is_active: req.is_active.unwrap_or(true),
            is_staff: req.is_staff.unwrap_or(false),
            is_superuser: req.is_superuser.unwrap_or(false),
        }
    }
}

impl From<AdminPatchReq> for AdminUserPatch {
    fn from(req: AdminPatchReq) -> Self {
        Self {
            email: req.email,
            name: req.name,
            password: req.password,
            is_active: req.is_active,
            is_staff: req.is_staff,
            is_superuser: req.is_superuser,
        }
    }
}
