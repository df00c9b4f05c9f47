// src/services/user_service.rs

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{Database, Store},
    middleware::rbac::{authorize, can, Action},
    models::{
        attachment::Attachment,
        auth::{display_name, CreateUserPayload, CurrentUser, ProfilePayload, UpdateUserPayload, User, UserProfile},
    },
    services::{
        auth::hash_password,
        upload_service::{PendingUpload, UploadKind, UploadStore},
    },
};

/// PUT /users/me: dados do perfil + avatar opcional.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub changes: ProfilePayload,
    pub avatar: Option<PendingUpload>,
}

#[derive(Clone)]
pub struct UserService {
    store: Store,
    uploads: UploadStore,
}

impl UserService {
    pub fn new(store: Store, uploads: UploadStore) -> Self {
        Self { store, uploads }
    }

    /// Admin e manager veem todos; `user` só a si mesmo.
    pub async fn list(&self, caller: &CurrentUser) -> Vec<UserProfile> {
        let see_all = can(caller, Action::ListAllUsers);
        self.store
            .read(|db| {
                db.users
                    .iter()
                    .filter(|u| see_all || u.id == caller.id)
                    .map(UserProfile::from)
                    .collect()
            })
            .await
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        payload: CreateUserPayload,
    ) -> Result<UserProfile, AppError> {
        authorize(caller, Action::CreateUser)?;
        payload.validate()?;

        let email = payload.email.unwrap_or_default().trim().to_string();
        if self.store.read(|db| db.email_taken(&email, None)).await {
            return Err(AppError::EmailAlreadyExists);
        }
        let password = hash_password(payload.password.unwrap_or_default()).await?;

        let user = User {
            id: Uuid::new_v4(),
            email,
            password,
            name: display_name(
                payload.name.as_deref(),
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
            )
            .unwrap_or_default(),
            first_name: payload.first_name,
            last_name: payload.last_name,
            role: payload.role.unwrap_or_default(),
            avatar: None,
            created_at: Utc::now(),
        };

        let profile = self
            .store
            .transaction(move |db| {
                if db.email_taken(&user.email, None) {
                    return Err(AppError::EmailAlreadyExists);
                }
                let profile = UserProfile::from(&user);
                db.insert_user(user);
                Ok(profile)
            })
            .await?;

        tracing::info!(user_id = %profile.id, actor = %caller.id, role = profile.role.as_str(), "👤 Usuário criado");
        Ok(profile)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        payload: UpdateUserPayload,
    ) -> Result<UserProfile, AppError> {
        self.store
            .read(|db| check_update(db, caller, id, &payload))
            .await?;

        let password_hash = match payload.password.clone() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let (profile, _) = self
            .store
            .transaction(|db| {
                check_update(db, caller, id, &payload)?;
                apply_update(db, id, &payload, password_hash, AvatarChange::Keep)
            })
            .await?;

        tracing::info!(user_id = %id, actor = %caller.id, "✏️ Usuário atualizado");
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        caller: &CurrentUser,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AppError> {
        let ProfileUpdate { changes, avatar } = update;
        let remove_avatar = changes.remove_avatar;
        let payload = UpdateUserPayload::from(changes);

        self.store
            .read(|db| check_update(db, caller, caller.id, &payload))
            .await?;
        if let Some(upload) = &avatar {
            self.uploads.check(UploadKind::Avatar, upload)?;
        }

        let password_hash = match payload.password.clone() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let saved = match avatar {
            Some(upload) => Some(self.uploads.save(UploadKind::Avatar, upload).await?),
            None => None,
        };
        let avatar_change = match (&saved, remove_avatar) {
            (Some(new), _) => AvatarChange::Replace(new.clone()),
            (None, true) => AvatarChange::Remove,
            (None, false) => AvatarChange::Keep,
        };

        let result = self
            .store
            .transaction(|db| {
                check_update(db, caller, caller.id, &payload)?;
                apply_update(db, caller.id, &payload, password_hash, avatar_change)
            })
            .await;

        match result {
            Ok((profile, previous_avatar)) => {
                if let Some(old) = previous_avatar {
                    self.uploads.discard(&old).await;
                }
                tracing::info!(user_id = %caller.id, "✏️ Perfil atualizado");
                Ok(profile)
            }
            Err(e) => {
                if let Some(file) = &saved {
                    self.uploads.discard(file).await;
                }
                Err(e)
            }
        }
    }
}

enum AvatarChange {
    Keep,
    Replace(Attachment),
    Remove,
}

// 404 → 403 → e-mail único
fn check_update(
    db: &Database,
    caller: &CurrentUser,
    id: Uuid,
    payload: &UpdateUserPayload,
) -> Result<(), AppError> {
    db.find_user(id).ok_or(AppError::NotFound("User"))?;
    authorize(caller, Action::UpdateUser { target: id })?;
    if payload.role.is_some() {
        authorize(caller, Action::ChangeRole)?;
    }
    payload.validate()?;
    if let Some(email) = &payload.email {
        if db.email_taken(email, Some(id)) {
            return Err(AppError::EmailAlreadyExists);
        }
    }
    Ok(())
}

/// Devolve o perfil novo e o avatar que saiu (para apagar do disco).
fn apply_update(
    db: &mut Database,
    id: Uuid,
    payload: &UpdateUserPayload,
    password_hash: Option<String>,
    avatar: AvatarChange,
) -> Result<(UserProfile, Option<Attachment>), AppError> {
    let user = db.user_mut(id).ok_or(AppError::NotFound("User"))?;

    if let Some(email) = &payload.email {
        user.email = email.trim().to_string();
    }
    if let Some(hash) = password_hash {
        user.password = hash;
    }
    if let Some(first) = &payload.first_name {
        user.first_name = Some(first.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(last) = &payload.last_name {
        user.last_name = Some(last.trim().to_string()).filter(|s| !s.is_empty());
    }
    if payload.name.is_some() || payload.first_name.is_some() || payload.last_name.is_some() {
        if let Some(name) = display_name(
            payload.name.as_deref(),
            user.first_name.as_deref(),
            user.last_name.as_deref(),
        ) {
            user.name = name;
        }
    }
    if let Some(role) = payload.role {
        user.role = role;
    }

    let previous_avatar = match avatar {
        AvatarChange::Keep => None,
        AvatarChange::Replace(new) => user.avatar.replace(new),
        AvatarChange::Remove => user.avatar.take(),
    };

    Ok((UserProfile::from(&*user), previous_avatar))
}
