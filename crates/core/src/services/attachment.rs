//! Opportunity attachment service

use super::{now, CrudService};
use crate::db::models::{Attachment, AttachmentActiveModel, AttachmentColumn, AttachmentEntity, OpportunityEntity};
use crate::db::query::{delete_required, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAttachment {
    pub opportunity_id: Uuid,

    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub file_name: String,

    #[validate(custom(function = "not_blank"))]
    pub file_url: String,

    #[validate(length(max = 50))]
    pub attachment_type: Option<String>,

    #[validate(length(max = 100))]
    pub mime_type: Option<String>,

    #[validate(range(min = 0))]
    pub file_size: Option<i64>,

    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub sam_attachment_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAttachment {
    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub file_name: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub file_url: Option<String>,

    #[validate(length(max = 50))]
    pub attachment_type: Option<String>,

    #[validate(length(max = 100))]
    pub mime_type: Option<String>,

    #[validate(range(min = 0))]
    pub file_size: Option<i64>,

    pub description: Option<String>,
}

#[derive(Clone)]
pub struct AttachmentService {
    pool: DbPool,
}

impl AttachmentService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_opportunity(&self, opportunity_id: Uuid) -> Result<Vec<Attachment>> {
        AttachmentEntity::find()
            .filter(AttachmentColumn::OpportunityId.eq(opportunity_id))
            .order_by_asc(AttachmentColumn::FileName)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_type(&self, attachment_type: &str) -> Result<Vec<Attachment>> {
        AttachmentEntity::find()
            .filter(AttachmentColumn::AttachmentType.eq(attachment_type))
            .order_by_desc(AttachmentColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_sam_attachment_id(&self, sam_attachment_id: &str) -> Result<Attachment> {
        AttachmentEntity::find()
            .filter(AttachmentColumn::SamAttachmentId.eq(sam_attachment_id))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, sam_attachment_id))
    }
}

#[async_trait]
impl CrudService for AttachmentService {
    type Model = Attachment;
    type Create = CreateAttachment;
    type Update = UpdateAttachment;

    const RESOURCE: &'static str = "Attachment";

    async fn create(&self, request: CreateAttachment) -> Result<Attachment> {
        validate_request(&request)?;
        find_required::<OpportunityEntity>(self.pool.read(), request.opportunity_id, "Opportunity").await?;

        if let Some(ref sam_id) = request.sam_attachment_id {
            let taken = AttachmentEntity::find()
                .filter(AttachmentColumn::SamAttachmentId.eq(sam_id.as_str()))
                .one(self.pool.write())
                .await?
                .is_some();
            if taken {
                return Err(AppError::duplicate(Self::RESOURCE, "sam_attachment_id", sam_id));
            }
        }

        let timestamp = now();
        let attachment = AttachmentActiveModel {
            id: Set(Uuid::new_v4()),
            opportunity_id: Set(request.opportunity_id),
            file_name: Set(request.file_name),
            file_url: Set(request.file_url),
            attachment_type: Set(request.attachment_type),
            mime_type: Set(request.mime_type),
            file_size: Set(request.file_size),
            description: Set(request.description),
            sam_attachment_id: Set(request.sam_attachment_id),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        attachment.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Attachment> {
        find_required::<AttachmentEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Attachment>> {
        let select = AttachmentEntity::find().order_by_desc(AttachmentColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateAttachment) -> Result<Attachment> {
        validate_request(&request)?;
        let existing = find_required::<AttachmentEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut attachment: AttachmentActiveModel = existing.into();
        if let Some(file_name) = request.file_name {
            attachment.file_name = Set(file_name);
        }
        if let Some(file_url) = request.file_url {
            attachment.file_url = Set(file_url);
        }
        if let Some(attachment_type) = request.attachment_type {
            attachment.attachment_type = Set(Some(attachment_type));
        }
        if let Some(mime_type) = request.mime_type {
            attachment.mime_type = Set(Some(mime_type));
        }
        if let Some(file_size) = request.file_size {
            attachment.file_size = Set(Some(file_size));
        }
        if let Some(description) = request.description {
            attachment.description = Set(Some(description));
        }
        attachment.updated_at = Set(now());

        attachment.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<AttachmentEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}
