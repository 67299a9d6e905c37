use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::service::files::FileStore;
use crate::service::stripe::StripeClient;
use tracing::{error, info};
use uuid::Uuid;

/// Deletes a user account and its provider-side footprint.
///
/// Billing and object-storage cleanup are best-effort: their failures are
/// logged and the deletion continues. The user-record delete is the
/// authoritative step, and its failure aborts the operation.
pub async fn delete_user_account(
    repo: &dyn UserRepository,
    billing: Option<&StripeClient>,
    files: &dyn FileStore,
    user_id: &Uuid,
) -> Result<(), AppError> {
    let user = repo.get_user_by_id(user_id).await?.ok_or(AppError::UserNotFound)?;

    if let (Some(stripe), Some(customer_id)) = (billing, user.stripe_customer_id.as_deref()) {
        if let Err(err) = cancel_billing(stripe, customer_id).await {
            error!(user_id = %user_id, customer_id = %customer_id, error = ?err, "failed to clean up billing data");
        }
    }

    match files.delete_user_files(user_id).await {
        Ok(deleted) => info!(user_id = %user_id, deleted, "removed stored files"),
        Err(err) => error!(user_id = %user_id, error = ?err, "failed to delete stored files"),
    }

    repo.delete_user(user_id).await?;
    info!(user_id = %user_id, email = %user.email, "account deleted");

    // TODO: revoke the user's other sessions once the session store keeps
    // a per-user index; only the session presented with the deletion
    // request is destroyed today.

    Ok(())
}

async fn cancel_billing(stripe: &StripeClient, customer_id: &str) -> Result<(), AppError> {
    let subscriptions = stripe.list_subscriptions(customer_id, "active").await?;
    for subscription in &subscriptions.data {
        stripe.cancel_subscription(&subscription.id).await?;
        info!(subscription_id = %subscription.id, "cancelled subscription");
    }
    stripe.delete_customer(customer_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryFileStore, MockRepository, sample_user};

    #[tokio::test]
    async fn deletes_user_and_stored_files() {
        let user = sample_user();
        let repo = MockRepository::with_user(user.clone());
        let files = MemoryFileStore::default();

        delete_user_account(&repo, None, &files, &user.id).await.expect("deletion should succeed");

        assert!(repo.users.lock().unwrap().is_empty());
        let deleted = files.deleted_prefixes.lock().unwrap();
        assert_eq!(deleted.as_slice(), [format!("users/{}/", user.id)]);
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let repo = MockRepository::default();
        let files = MemoryFileStore::default();

        let err = delete_user_account(&repo, None, &files, &uuid::Uuid::new_v4()).await.expect_err("must fail");
        assert!(matches!(err, AppError::UserNotFound));
        assert!(files.deleted_prefixes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_failure_does_not_block_deletion() {
        let user = sample_user();
        let repo = MockRepository::with_user(user.clone());
        let files = MemoryFileStore::failing();

        delete_user_account(&repo, None, &files, &user.id).await.expect("deletion should still succeed");
        assert!(repo.users.lock().unwrap().is_empty());
    }
}
