mod common;

use anyhow::Result;
use helpdesk_api::domain::{Role, TenantType};
use helpdesk_api::error::ApiError;
use helpdesk_api::services::{LoginRequest, RegisterUser};

#[tokio::test]
async fn login_issues_a_token_carrying_tenant_context() -> Result<()> {
    let w = common::world().await?;
    let resp = w
        .state
        .auth
        .login(w.lacoste_hq.id, LoginRequest {
            email: "admin@lacoste.com".to_string(),
            password: "s3cret!".to_string(),
        })
        .await?;

    let claims = w.state.signer.verify(&resp.token)?;
    assert_eq!(claims.user_id, w.lacoste_admin.id);
    assert_eq!(claims.tenant_slug, "lacoste-matriz");
    assert_eq!(claims.role, Role::FranchisorAdmin);
    assert_eq!(claims.tenant_type, TenantType::Franchisor);
    assert_eq!(claims.brand.as_deref(), Some("Lacoste"));
    Ok(())
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() -> Result<()> {
    let w = common::world().await?;

    let bad_password = w
        .state
        .auth
        .login(w.lacoste_hq.id, LoginRequest {
            email: "admin@lacoste.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    let bad_email = w
        .state
        .auth
        .login(w.lacoste_hq.id, LoginRequest {
            email: "nobody@lacoste.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(bad_password.to_string(), bad_email.to_string());
    Ok(())
}

#[tokio::test]
async fn login_is_blocked_for_inactive_tenant() -> Result<()> {
    let w = common::world().await?;
    w.state.tenants.toggle_active(w.mcdonalds_hq.id).await?;

    let err = w
        .state
        .auth
        .login(w.mcdonalds_hq.id, LoginRequest {
            email: "admin@mcdonalds.com".to_string(),
            password: "s3cret!".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn role_tenant_type_compatibility_is_enforced_at_registration() -> Result<()> {
    let w = common::world().await?;

    // FRANCHISE_ADMIN cannot live in a franchisor tenant
    let err = w
        .state
        .auth
        .register(RegisterUser {
            name: "bad".to_string(),
            email: "bad@lacoste.com".to_string(),
            password: "s3cret!".to_string(),
            role: Role::FranchiseAdmin,
            tenant_id: Some(w.lacoste_hq.id),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    // AGENT fits in a franchise
    let agent = w
        .state
        .auth
        .register(RegisterUser {
            name: "ok".to_string(),
            email: "ok@shopping.lacoste.com".to_string(),
            password: "s3cret!".to_string(),
            role: Role::Agent,
            tenant_id: Some(w.lacoste_shopping.id),
        })
        .await?;
    assert_eq!(agent.tenant_id, w.lacoste_shopping.id);
    Ok(())
}

#[tokio::test]
async fn stale_token_fails_revalidation_after_deactivation() -> Result<()> {
    use helpdesk_api::store::UserStore;

    let w = common::world().await?;
    let resp = w
        .state
        .auth
        .login(w.lacoste_centro.id, LoginRequest {
            email: "agent@centro.lacoste.com".to_string(),
            password: "s3cret!".to_string(),
        })
        .await?;
    let claims = w.state.signer.verify(&resp.token)?;

    let mut user = resp.user;
    user.is_active = false;
    w.store.insert_user(user).await?;

    let err = w
        .state
        .auth
        .validate_user(claims.user_id, claims.tenant_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn accessible_tenants_follow_the_hierarchy() -> Result<()> {
    let w = common::world().await?;

    let for_franchisor = w
        .state
        .auth
        .get_accessible_tenants(w.lacoste_admin.id)
        .await?;
    assert_eq!(for_franchisor.len(), 3);

    let for_agent = w
        .state
        .auth
        .get_accessible_tenants(w.centro_agent.id)
        .await?;
    assert_eq!(for_agent.len(), 1);
    assert_eq!(for_agent[0].id, w.lacoste_centro.id);
    Ok(())
}
