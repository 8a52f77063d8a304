//! Company management gates.
//!
//! Status changes cascade to the company's non-super-admin users inside a
//! single store transaction; this module only enforces who may ask.

use siteform_storage::{
    Company, CompanyId, CreateCompanyParams, EntityStatus, RoleName, Store, User,
};

use crate::authz::has_role;
use crate::CoreError;

/// A requested company.
#[derive(Clone, Debug)]
pub struct NewCompany {
    pub name: String,
    pub email: Option<String>,
    pub status: Option<EntityStatus>,
}

/// Create a company owned by the acting super admin. The contact email
/// defaults to the creator's own and may not collide with a company
/// belonging to someone else.
pub async fn create_company(
    store: &dyn Store,
    acting: &User,
    request: &NewCompany,
) -> Result<Company, CoreError> {
    if !has_role(store, acting, RoleName::SuperAdmin).await? {
        return Err(CoreError::Forbidden("only super admin can create companies"));
    }

    let email = request.email.clone().unwrap_or_else(|| acting.email.clone());
    if let Some(existing) = store.find_company_by_email(&email).await? {
        if existing.created_by_user_id != Some(acting.id) {
            return Err(CoreError::Forbidden(
                "email is already used as another company's contact",
            ));
        }
    }

    Ok(store
        .create_company(&CreateCompanyParams {
            name: request.name.clone(),
            email: Some(email),
            status: request.status.unwrap_or(EntityStatus::Active),
            created_by_user_id: Some(acting.id),
        })
        .await?)
}

/// Set a company's status (super_admin only); the store cascades it to the
/// company's non-super-admin users atomically.
pub async fn set_company_status(
    store: &dyn Store,
    acting: &User,
    company_id: &CompanyId,
    status: EntityStatus,
) -> Result<Company, CoreError> {
    if !has_role(store, acting, RoleName::SuperAdmin).await? {
        return Err(CoreError::Forbidden(
            "only super admin can change company status",
        ));
    }
    let company = store.set_company_status(company_id, status).await?;
    tracing::info!(company = %company.id, status = status.as_str(), by = %acting.id,
        "company status changed");
    Ok(company)
}

/// Delete a company and its non-super-admin users. Only the super admin
/// who created the company may delete it.
pub async fn delete_company(
    store: &dyn Store,
    acting: &User,
    company_id: &CompanyId,
) -> Result<(), CoreError> {
    if !has_role(store, acting, RoleName::SuperAdmin).await? {
        return Err(CoreError::Forbidden("only super admin can delete companies"));
    }
    let Some(company) = store.find_company_by_id(company_id).await? else {
        return Err(CoreError::Store(siteform_storage::StoreError::NotFound));
    };
    if company.created_by_user_id != Some(acting.id) {
        return Err(CoreError::Forbidden(
            "only the creating super admin can delete this company",
        ));
    }
    store.delete_company(company_id).await?;
    tracing::info!(company = %company_id, by = %acting.id, "company deleted");
    Ok(())
}
