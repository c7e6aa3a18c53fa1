//! Point-of-contact service

use super::{now, CrudService};
use crate::db::models::{Contact, ContactActiveModel, ContactColumn, ContactEntity};
use crate::db::query::{delete_required, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::validate_request;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateContact {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    #[validate(length(max = 255))]
    pub full_name: Option<String>,

    #[validate(email, length(max = 255))]
    pub email: Option<String>,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(length(max = 200))]
    pub title: Option<String>,

    pub organization_id: Option<Uuid>,

    pub agency_id: Option<Uuid>,

    pub opportunity_id: Option<Uuid>,

    #[validate(length(max = 50))]
    pub contact_type: Option<String>,

    pub is_primary: Option<bool>,
}

/// Same shape as the create request; every field is optional
pub type UpdateContact = CreateContact;

/// Which parent a contact is attached to
#[derive(Debug, Clone, Copy)]
enum Owner {
    Organization(Uuid),
    Agency(Uuid),
    Opportunity(Uuid),
}

impl Owner {
    fn filter(self) -> sea_orm::sea_query::SimpleExpr {
        match self {
            Owner::Organization(id) => ContactColumn::OrganizationId.eq(id),
            Owner::Agency(id) => ContactColumn::AgencyId.eq(id),
            Owner::Opportunity(id) => ContactColumn::OpportunityId.eq(id),
        }
    }
}

#[derive(Clone)]
pub struct ContactService {
    pool: DbPool,
}

impl ContactService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Contact> {
        ContactEntity::find()
            .filter(ContactColumn::Email.eq(email))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, email))
    }

    pub async fn find_by_organization(&self, organization_id: Uuid) -> Result<Vec<Contact>> {
        self.find_by_owner(Owner::Organization(organization_id)).await
    }

    pub async fn find_by_agency(&self, agency_id: Uuid) -> Result<Vec<Contact>> {
        self.find_by_owner(Owner::Agency(agency_id)).await
    }

    pub async fn find_by_opportunity(&self, opportunity_id: Uuid) -> Result<Vec<Contact>> {
        self.find_by_owner(Owner::Opportunity(opportunity_id)).await
    }

    pub async fn find_primary_by_organization(&self, organization_id: Uuid) -> Result<Contact> {
        self.find_primary(Owner::Organization(organization_id)).await
    }

    pub async fn find_primary_by_agency(&self, agency_id: Uuid) -> Result<Contact> {
        self.find_primary(Owner::Agency(agency_id)).await
    }

    pub async fn find_primary_by_opportunity(&self, opportunity_id: Uuid) -> Result<Contact> {
        self.find_primary(Owner::Opportunity(opportunity_id)).await
    }

    pub async fn find_by_type(&self, contact_type: &str) -> Result<Vec<Contact>> {
        ContactEntity::find()
            .filter(ContactColumn::ContactType.eq(contact_type))
            .order_by_asc(ContactColumn::LastName)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn find_by_owner(&self, owner: Owner) -> Result<Vec<Contact>> {
        ContactEntity::find()
            .filter(owner.filter())
            .order_by_desc(ContactColumn::IsPrimary)
            .order_by_asc(ContactColumn::LastName)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn find_primary(&self, owner: Owner) -> Result<Contact> {
        let id = match owner {
            Owner::Organization(id) | Owner::Agency(id) | Owner::Opportunity(id) => id,
        };

        ContactEntity::find()
            .filter(owner.filter())
            .filter(ContactColumn::IsPrimary.eq(true))
            .order_by_desc(ContactColumn::UpdatedAt)
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "Primary contact".to_string(),
                id: id.to_string(),
            })
    }
}

#[async_trait]
impl CrudService for ContactService {
    type Model = Contact;
    type Create = CreateContact;
    type Update = UpdateContact;

    const RESOURCE: &'static str = "Contact";

    async fn create(&self, request: CreateContact) -> Result<Contact> {
        validate_request(&request)?;

        let timestamp = now();
        let contact = ContactActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            full_name: Set(request.full_name),
            email: Set(request.email),
            phone: Set(request.phone),
            title: Set(request.title),
            organization_id: Set(request.organization_id),
            agency_id: Set(request.agency_id),
            opportunity_id: Set(request.opportunity_id),
            contact_type: Set(request.contact_type),
            is_primary: Set(request.is_primary.unwrap_or(false)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        contact.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Contact> {
        find_required::<ContactEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Contact>> {
        let select = ContactEntity::find().order_by_desc(ContactColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateContact) -> Result<Contact> {
        validate_request(&request)?;
        let existing = find_required::<ContactEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut contact: ContactActiveModel = existing.into();
        if let Some(first_name) = request.first_name {
            contact.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = request.last_name {
            contact.last_name = Set(Some(last_name));
        }
        if let Some(full_name) = request.full_name {
            contact.full_name = Set(Some(full_name));
        }
        if let Some(email) = request.email {
            contact.email = Set(Some(email));
        }
        if let Some(phone) = request.phone {
            contact.phone = Set(Some(phone));
        }
        if let Some(title) = request.title {
            contact.title = Set(Some(title));
        }
        if let Some(organization_id) = request.organization_id {
            contact.organization_id = Set(Some(organization_id));
        }
        if let Some(agency_id) = request.agency_id {
            contact.agency_id = Set(Some(agency_id));
        }
        if let Some(opportunity_id) = request.opportunity_id {
            contact.opportunity_id = Set(Some(opportunity_id));
        }
        if let Some(contact_type) = request.contact_type {
            contact.contact_type = Set(Some(contact_type));
        }
        if let Some(is_primary) = request.is_primary {
            contact.is_primary = Set(is_primary);
        }
        contact.updated_at = Set(now());

        contact.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<ContactEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;

    #[test]
    fn test_email_format() {
        let request = CreateContact {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "email"));

        let request = CreateContact {
            email: Some("co@agency.gov".into()),
            ..Default::default()
        };
        assert!(validate_request(&request).is_ok());
    }

    #[tokio::test]
    async fn test_delete_removes_the_row() {
        let pool = testing::pool(testing::postgres().append_exec_results([testing::rows_affected(1)]));
        ContactService::new(pool.clone()).delete(Uuid::new_v4()).await.unwrap();

        let sql = testing::executed_sql(pool);
        assert!(sql.contains(r#"DELETE FROM "contacts""#));
        assert!(!sql.contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_delete_of_nothing_is_not_found() {
        let pool = testing::pool(testing::postgres().append_exec_results([testing::rows_affected(0)]));

        let err = ContactService::new(pool).delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref resource_type, .. } if resource_type == "Contact"));
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let contact = testing::contact("co@agency.gov");
        let pool = testing::pool(testing::postgres().append_query_results([[contact.clone()]]));

        let found = ContactService::new(pool).find_by_id(contact.id).await.unwrap();
        assert_eq!(found, contact);
    }
}
